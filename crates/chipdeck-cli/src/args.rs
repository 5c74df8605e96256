//! Command-line argument parsing for the chipdeck CLI.

use std::env;
use std::path::PathBuf;

/// Parsed command-line arguments.
#[derive(Debug)]
pub struct CliArgs {
    /// File to play or directory to list.
    pub path: Option<PathBuf>,
    /// Track to start on (plugin numbering; 0 lets the plugin choose).
    pub start_track: usize,
    /// Start the session paused.
    pub start_paused: bool,
    /// Settings JSON file.
    pub settings_file: Option<PathBuf>,
    /// Language catalog JSON file.
    pub lang_file: Option<PathBuf>,
    /// Plugin data directory (SID ROM images).
    pub data_dir: PathBuf,
    /// Whether help was requested.
    pub show_help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        CliArgs {
            path: None,
            start_track: 0,
            start_paused: false,
            settings_file: None,
            lang_file: None,
            data_dir: PathBuf::from("data"),
            show_help: false,
        }
    }
}

impl CliArgs {
    /// Parse `std::env::args()`.
    pub fn parse() -> Result<CliArgs, String> {
        Self::parse_from(env::args().skip(1))
    }

    fn parse_from(args: impl Iterator<Item = String>) -> Result<CliArgs, String> {
        let mut parsed = CliArgs::default();
        let mut args = args;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => parsed.show_help = true,
                "--paused" => parsed.start_paused = true,
                "--track" => {
                    let value = args.next().ok_or("--track needs a number")?;
                    parsed.start_track = value
                        .parse()
                        .map_err(|_| format!("invalid track number '{value}'"))?;
                }
                "--settings" => {
                    let value = args.next().ok_or("--settings needs a file path")?;
                    parsed.settings_file = Some(PathBuf::from(value));
                }
                "--lang" => {
                    let value = args.next().ok_or("--lang needs a file path")?;
                    parsed.lang_file = Some(PathBuf::from(value));
                }
                "--data-dir" => {
                    let value = args.next().ok_or("--data-dir needs a directory")?;
                    parsed.data_dir = PathBuf::from(value);
                }
                other if other.starts_with('-') => {
                    return Err(format!("unknown option '{other}'"));
                }
                other => {
                    if parsed.path.is_some() {
                        return Err("only one path may be given".to_string());
                    }
                    parsed.path = Some(PathBuf::from(other));
                }
            }
        }

        Ok(parsed)
    }

    /// Help text.
    pub fn help() -> &'static str {
        "chipdeck - chiptune player\n\
         \n\
         USAGE:\n\
         \x20   chipdeck [OPTIONS] <FILE|DIRECTORY>\n\
         \n\
         OPTIONS:\n\
         \x20   --track <N>        start on sub-song N\n\
         \x20   --paused           load the file but start paused\n\
         \x20   --settings <FILE>  settings JSON file\n\
         \x20   --lang <FILE>      language catalog JSON file\n\
         \x20   --data-dir <DIR>   plugin data directory (SID ROMs), default ./data\n\
         \x20   -h, --help         show this help\n\
         \n\
         COMMANDS (stdin while playing):\n\
         \x20   p = pause/resume, s = stop, n/b = next/previous sub-song, q = quit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, String> {
        CliArgs::parse_from(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_path_and_options() {
        let args = parse(&["--track", "3", "--paused", "music/tune.sid"]).unwrap();
        assert_eq!(args.path, Some(PathBuf::from("music/tune.sid")));
        assert_eq!(args.start_track, 3);
        assert!(args.start_paused);
    }

    #[test]
    fn rejects_unknown_options_and_extra_paths() {
        assert!(parse(&["--loud"]).is_err());
        assert!(parse(&["a.mod", "b.mod"]).is_err());
        assert!(parse(&["--track"]).is_err());
        assert!(parse(&["--track", "x"]).is_err());
    }

    #[test]
    fn defaults_apply() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.path, None);
        assert_eq!(args.start_track, 0);
        assert_eq!(args.data_dir, PathBuf::from("data"));
        assert!(!args.show_help);
    }
}
