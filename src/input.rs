use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Subnets read from one input source, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetList {
    /// Identifies the source, normally the path as given on the command line.
    pub id: String,
    pub subnets: Vec<String>,
}

impl SubnetList {
    pub fn new(id: impl Into<String>, subnets: Vec<String>) -> Self {
        Self {
            id: id.into(),
            subnets,
        }
    }

    pub fn parse(id: impl Into<String>, content: &str) -> Self {
        Self::new(id, parse_subnet_lines(content))
    }
}

/// One subnet per line. Blank lines and `#` comments are skipped.
pub fn parse_subnet_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn load_subnet_list(path: &Path) -> Result<SubnetList> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read subnet list {:?}", path))?;
    let list = SubnetList::parse(path.display().to_string(), &content);

    info!(action = "loaded", component = "input", file_path = ?path, subnet_count = list.subnets.len(), "Loaded subnet list");
    Ok(list)
}

/// Load every readable file. Unreadable files are reported and left out.
pub fn load_subnet_lists(paths: &[PathBuf]) -> Vec<SubnetList> {
    paths
        .iter()
        .filter_map(|path| match load_subnet_list(path) {
            Ok(list) => Some(list),
            Err(e) => {
                let error = format!("{:#}", e);
                warn!(action = "load", component = "input", file_path = ?path, error = %error, "Skipping subnet list");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::process;

    #[test]
    fn test_parse_skips_blank_and_comment_lines() {
        let content = "# China Telecom\n1.0.1.0/24\n\n  1.0.2.0/23  \r\n#1.0.8.0/21\n";
        assert_eq!(parse_subnet_lines(content), vec!["1.0.1.0/24", "1.0.2.0/23"]);
    }

    #[test]
    fn test_load_uses_path_as_id() {
        let path = env::temp_dir().join(format!("ecslookup-input-{}.txt", process::id()));
        fs::write(&path, "8.8.8.0/24\n9.9.9.0/24\n").unwrap();

        let lists = load_subnet_lists(&[path.clone(), path.with_extension("missing")]);
        fs::remove_file(&path).unwrap();

        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].id, path.display().to_string());
        assert_eq!(lists[0].subnets, vec!["8.8.8.0/24", "9.9.9.0/24"]);
    }
}
