use serde_derive::{Deserialize, Serialize};

/// options of event deserializer
///
/// checksum is switched automatically once a format description
/// event is read, so it only needs to be set for streams that
/// start in the middle of a binlog file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeserializerOpts {
    /// whether events end with 4-byte crc32 checksum
    pub checksum: bool,
    /// whether to verify the checksum if present
    pub validate_checksum: bool,
}

impl Default for DeserializerOpts {
    fn default() -> Self {
        DeserializerOpts {
            checksum: false,
            validate_checksum: true,
        }
    }
}

impl DeserializerOpts {
    pub fn checksum(mut self, checksum: bool) -> Self {
        self.checksum = checksum;
        self
    }

    pub fn validate_checksum(mut self, validate_checksum: bool) -> Self {
        self.validate_checksum = validate_checksum;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opts_builder() {
        let opts = DeserializerOpts::default()
            .checksum(true)
            .validate_checksum(false);
        assert!(opts.checksum);
        assert!(!opts.validate_checksum);
    }

    #[test]
    fn test_opts_serde() -> serde_json::Result<()> {
        let opts: DeserializerOpts = serde_json::from_str(r#"{"checksum": true}"#)?;
        assert_eq!(DeserializerOpts::default().checksum(true), opts);
        let json = serde_json::to_string(&opts)?;
        assert_eq!(r#"{"checksum":true,"validate_checksum":true}"#, json);
        Ok(())
    }
}
