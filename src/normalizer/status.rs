pub struct StatusParser;

impl StatusParser {
    const STATUS_MARKER: &'static str = "[Status:";

    pub fn parse(output: &str) -> Vec<String> {
        output.lines().filter_map(Self::parse_line).collect()
    }

    fn parse_line(line: &str) -> Option<String> {
        let (_, rest) = line.split_once(Self::STATUS_MARKER)?;
        let token = rest
            .split_whitespace()
            .next()?
            .trim_end_matches([',', ']']);
        (!token.is_empty()).then(|| token.to_string())
    }
}
