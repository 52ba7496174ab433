pub struct PortParser;

impl PortParser {
    const PROTOCOL_MARKER: &'static str = "/tcp";
    const OPEN_MARKER: &'static str = "open";

    pub fn parse(output: &str) -> Vec<u16> {
        output
            .lines()
            .filter(|line| line.contains(Self::PROTOCOL_MARKER) && line.contains(Self::OPEN_MARKER))
            .filter_map(Self::parse_line)
            .collect()
    }

    fn parse_line(line: &str) -> Option<u16> {
        let (port, _) = line.split_once('/')?;
        port.trim().parse().ok()
    }
}
