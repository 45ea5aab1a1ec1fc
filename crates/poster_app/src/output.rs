use std::env;
use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

/// Appends `name=value` to the file named by `GITHUB_OUTPUT`, if set.
pub fn set_github_output(name: &str, value: impl Display) -> io::Result<()> {
    match env::var_os("GITHUB_OUTPUT") {
        Some(path) if !path.is_empty() => append_output(Path::new(&path), name, value),
        _ => Ok(()),
    }
}

fn append_output(path: &Path, name: &str, value: impl Display) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{name}={value}")
}

#[cfg(test)]
mod tests {
    use super::append_output;
    use std::fs;

    #[test]
    fn outputs_are_appended() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("github_output");
        fs::write(&path, "earlier=1\n").unwrap();

        append_output(&path, "posts_published", 2).unwrap();
        append_output(&path, "posts_published", 3).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "earlier=1\nposts_published=2\nposts_published=3\n"
        );
    }
}
