pub struct PathParser;

impl PathParser {
    pub fn parse(output: &str) -> Vec<String> {
        output
            .lines()
            .map(str::trim_start)
            .filter(|line| line.starts_with('/'))
            .filter_map(|line| line.split_whitespace().next())
            .map(str::to_string)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gobuster_output() {
        let output = "
    /admin (Status: 200)
    /test (Status: 301)
    ";
        assert_eq!(PathParser::parse(output), vec!["/admin", "/test"]);
    }

    #[test]
    fn test_banner_lines_ignored() {
        let output = "===============\nGobuster v3.6\n[+] Url: http://example.com\n/login.php            (Status: 200) [Size: 512]\nProgress: 4614 / 4615";
        assert_eq!(PathParser::parse(output), vec!["/login.php"]);
    }
}
