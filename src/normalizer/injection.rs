use crate::models::InjectionVerdict;

pub struct InjectionParser;

impl InjectionParser {
    const VULNERABLE_MARKER: &'static str = "is vulnerable";

    pub fn parse(output: &str) -> InjectionVerdict {
        InjectionVerdict {
            vulnerable: output.to_lowercase().contains(Self::VULNERABLE_MARKER),
        }
    }
}
