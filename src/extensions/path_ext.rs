use std::path::Path;

pub trait FileName {
    fn string_file_name(&self) -> &str;
}

impl FileName for Path {
    fn string_file_name(&self) -> &str {
        self.file_name().and_then(|s| s.to_str()).unwrap_or("unknown")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    #[test]
    fn string_file_name_returns_the_last_component() {
        let path = PathBuf::from("documents/track-2025-03-01T10-04-05-042Z.csv");

        assert_eq!(path.string_file_name(), "track-2025-03-01T10-04-05-042Z.csv");
    }

    #[test]
    fn string_file_name_of_a_root_is_unknown() {
        assert_eq!(Path::new("/").string_file_name(), "unknown");
    }
}
