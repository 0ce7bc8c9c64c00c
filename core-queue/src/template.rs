//! Command template engine.
//!
//! Pure, synchronous substitution of a fixed placeholder set into a
//! user-supplied command template. Placeholders are literal `{name}` tokens;
//! anything that is not a known placeholder is passed through verbatim, so a
//! template containing shell syntax like `${HOME}` or an unknown `{foo}`
//! renders unchanged.
//!
//! | Placeholder      | Resolves to                                            |
//! |------------------|--------------------------------------------------------|
//! | `{url}`          | canonical web URL, or the local path for local songs   |
//! | `{ext}`          | file extension without dot, local songs only           |
//! | `{file_name}`    | file name, local songs only                            |
//! | `{title}`        | song title                                             |
//! | `{image_url}`    | artwork location or empty                              |
//! | `{id}`           | provider track id, empty for local songs               |
//! | `{release_date}` | release date                                           |
//! | `{artists}`      | artist names joined with `", "`                        |
//! | `{duration}`     | duration in whole seconds                              |
//! | `{album}`        | album name                                             |

use std::path::Path;

use crate::models::QueueItem;

/// Render `template` against one queue item.
pub fn render_command(template: &str, item: &QueueItem) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find('}') {
            Some(close) => {
                let name = &after_open[..close];
                match placeholder_value(name, item) {
                    Some(value) => out.push_str(&value),
                    None => {
                        // Unknown placeholder stays verbatim.
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after_open[close + 1..];
            }
            None => {
                // Unterminated brace, keep the tail as-is.
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

fn placeholder_value(name: &str, item: &QueueItem) -> Option<String> {
    let song = &item.song;
    match name {
        "url" => Some(match song.source.track_url(&song.id) {
            Some(url) => url,
            // Local songs carry their path as the id.
            None => song.id.clone(),
        }),
        "ext" => Some(if song.is_local() {
            Path::new(&song.id)
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_string()
        } else {
            String::new()
        }),
        "file_name" => Some(if song.is_local() {
            Path::new(&song.id)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string()
        } else {
            String::new()
        }),
        "title" => Some(song.title.clone()),
        "image_url" => Some(song.image_location.clone().unwrap_or_default()),
        "id" => Some(if song.is_local() {
            String::new()
        } else {
            song.id.clone()
        }),
        "release_date" => Some(song.release_date.clone()),
        "artists" => Some(song.artists.join(", ")),
        "duration" => Some(song.duration_secs.to_string()),
        "album" => Some(song.album_name.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SongRecord, Source};

    fn item(song: SongRecord) -> QueueItem {
        QueueItem::new(song, 0)
    }

    #[test]
    fn test_remote_title_and_url() {
        let item = item(SongRecord::new(Source::Deezer, "123", "Foo"));
        assert_eq!(
            render_command("echo {title} {url}", &item),
            "echo Foo https://www.deezer.com/track/123"
        );
    }

    #[test]
    fn test_remote_has_empty_local_fields() {
        let item = item(SongRecord::new(Source::Spotify, "abc", "Foo"));
        assert_eq!(render_command("[{ext}|{file_name}|{id}]", &item), "[||abc]");
    }

    #[test]
    fn test_local_song_resolves_path_fields() {
        let item = item(SongRecord::new(
            Source::Local,
            "/music/dir/track.flac",
            "Foo",
        ));
        assert_eq!(
            render_command("{url} {ext} {file_name} {id}", &item),
            "/music/dir/track.flac flac track.flac "
        );
    }

    #[test]
    fn test_metadata_placeholders() {
        let item = item(
            SongRecord::new(Source::Qobuz, "9", "Song")
                .with_artists(vec!["One".to_string(), "Two".to_string()])
                .with_album_name("LP")
                .with_release_date("2024-05-01")
                .with_duration_secs(187)
                .with_image_location("https://img.example/cover.jpg"),
        );
        assert_eq!(
            render_command(
                "{artists} | {album} | {release_date} | {duration} | {image_url}",
                &item
            ),
            "One, Two | LP | 2024-05-01 | 187 | https://img.example/cover.jpg"
        );
    }

    #[test]
    fn test_unknown_placeholder_left_verbatim() {
        let item = item(SongRecord::new(Source::Deezer, "1", "T"));
        assert_eq!(
            render_command("run {nope} on {title}", &item),
            "run {nope} on T"
        );
    }

    #[test]
    fn test_unterminated_brace_left_verbatim() {
        let item = item(SongRecord::new(Source::Deezer, "1", "T"));
        assert_eq!(render_command("echo {title", &item), "echo {title");
    }

    #[test]
    fn test_value_is_not_rescanned() {
        // A title containing a placeholder token must not cascade.
        let item = item(SongRecord::new(Source::Deezer, "1", "{url}"));
        assert_eq!(render_command("{title}", &item), "{url}");
    }

    #[test]
    fn test_missing_image_is_empty() {
        let item = item(SongRecord::new(Source::Deezer, "1", "T"));
        assert_eq!(render_command("<{image_url}>", &item), "<>");
    }
}
