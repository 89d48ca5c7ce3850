// Record name validation (RFC 1035 label rules).

use crate::error::{Error, Result};

/// Validate a DNS record name before any API call
///
/// Accepts a leading `*` label for wildcards and underscores for service
/// labels such as `_dmarc`.
pub fn validate_record_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_input("Record name cannot be empty"));
    }

    if name.len() > 253 {
        return Err(Error::invalid_input(format!(
            "Record name too long: {} chars (max 253). Got: {}",
            name.len(),
            name
        )));
    }

    for (i, label) in name.split('.').enumerate() {
        if label.is_empty() {
            return Err(Error::invalid_input(format!(
                "Record name has empty label: '{}'",
                name
            )));
        }

        if i == 0 && label == "*" {
            continue;
        }

        if label.len() > 63 {
            return Err(Error::invalid_input(format!(
                "Label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(Error::invalid_input(format!(
                "Label contains invalid characters: '{}'",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::invalid_input(format!(
                "Label cannot start or end with hyphen: '{}'",
                label
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_names() {
        for name in ["example.com", "api.example.com", "*.example.com", "_dmarc.example.com"] {
            validate_record_name(name).unwrap();
        }
    }

    #[test]
    fn rejects_malformed_names() {
        let long_label = "a".repeat(64);
        let long_label_name = format!("{}.com", long_label);
        let too_long = format!("{}.com", ["abc"; 70].join("."));
        for name in [
            "",
            "example..com",
            ".example.com",
            "-api.example.com",
            "api-.example.com",
            "api example.com",
            "api.*.example.com",
            long_label_name.as_str(),
            too_long.as_str(),
        ] {
            assert!(
                matches!(validate_record_name(name), Err(Error::InvalidInput(_))),
                "accepted {:?}",
                name
            );
        }
    }
}
