//! Activation codes
//!
//! An activation code names the SM-DP+ that holds a profile and the matching
//! ID the profile is reserved under. Its text form is
//! `LPA:1$<host>$<matchingId>[$<oid>][$<ccFlag>]`, usually scanned from a QR
//! code. The device IMEI and the confirmation code are not part of the text
//! and are attached before the download starts.

use std::fmt;
use std::str::FromStr;

use url::Url;
use zeroize::Zeroizing;

use crate::types::Imei;
use crate::{Error, Result};

const PREFIX: &str = "LPA:";
const FORMAT: &str = "1";

/// Everything needed to start a profile download
#[derive(Clone, Default)]
pub struct ActivationCode {
    /// SM-DP+ host, optionally with a port
    pub smdp_address: String,
    /// Matching ID, may be empty
    pub matching_id: String,
    /// SM-DP+ OID
    pub oid: Option<String>,
    /// Whether the code announces that a confirmation code is needed
    pub confirmation_code_required: bool,
    /// Confirmation code, cleared from memory on drop
    pub confirmation_code: Option<Zeroizing<String>>,
    /// IMEI of the device
    pub imei: Option<Imei>,
}

impl ActivationCode {
    /// Activation code for an SM-DP+ and matching ID
    pub fn new(smdp_address: impl Into<String>, matching_id: impl Into<String>) -> Self {
        Self {
            smdp_address: smdp_address.into(),
            matching_id: matching_id.into(),
            ..Default::default()
        }
    }

    /// Attach the device IMEI
    pub fn with_imei(mut self, imei: Imei) -> Self {
        self.imei = Some(imei);
        self
    }

    /// Attach a confirmation code
    pub fn with_confirmation_code(mut self, code: impl Into<String>) -> Self {
        self.confirmation_code = Some(Zeroizing::new(code.into()));
        self
    }

    /// Set the SM-DP+ OID
    pub fn with_oid(mut self, oid: impl Into<String>) -> Self {
        self.oid = Some(oid.into());
        self
    }

    /// Check the code is complete enough to start a download
    pub fn validate(&self) -> Result<()> {
        if self.smdp_address.is_empty() {
            return Err(Error::InvalidActivationCode("missing SM-DP+ address"));
        }
        if self.imei.is_none() {
            return Err(Error::InvalidActivationCode("missing IMEI"));
        }
        Ok(())
    }

    /// Base URL of the SM-DP+
    pub fn smdp_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!("https://{}", self.smdp_address))?)
    }

    /// Host part of the SM-DP+ address, as sent in InitiateAuthentication
    pub fn smdp_host(&self) -> Result<String> {
        self.smdp_url()?
            .host_str()
            .map(str::to_owned)
            .ok_or(Error::InvalidActivationCode("SM-DP+ address has no host"))
    }

    /// Confirmation code, or an empty string
    pub fn confirmation_code(&self) -> &str {
        self.confirmation_code.as_deref().map_or("", String::as_str)
    }
}

impl FromStr for ActivationCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let body = match s.get(..PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(PREFIX) => &s[PREFIX.len()..],
            _ => s,
        };

        let mut parts = body.split('$');
        if parts.next() != Some(FORMAT) {
            return Err(Error::InvalidActivationCode("unsupported format"));
        }
        let smdp_address = parts
            .next()
            .filter(|address| !address.is_empty())
            .ok_or(Error::InvalidActivationCode("missing SM-DP+ address"))?;
        let matching_id = parts.next().unwrap_or_default();
        let oid = parts.next().filter(|oid| !oid.is_empty());
        let confirmation_code_required = match parts.next() {
            None | Some("" | "0") => false,
            Some("1") => true,
            Some(_) => return Err(Error::InvalidActivationCode("invalid confirmation code flag")),
        };
        if parts.next().is_some() {
            return Err(Error::InvalidActivationCode("too many fields"));
        }

        Ok(Self {
            smdp_address: smdp_address.to_owned(),
            matching_id: matching_id.to_owned(),
            oid: oid.map(str::to_owned),
            confirmation_code_required,
            ..Default::default()
        })
    }
}

impl fmt::Display for ActivationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}{FORMAT}${}${}", self.smdp_address, self.matching_id)?;
        if self.oid.is_some() || self.confirmation_code_required {
            write!(f, "${}", self.oid.as_deref().unwrap_or_default())?;
        }
        if self.confirmation_code_required {
            f.write_str("$1")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ActivationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationCode")
            .field("smdp_address", &self.smdp_address)
            .field("matching_id", &self.matching_id)
            .field("oid", &self.oid)
            .field("confirmation_code_required", &self.confirmation_code_required)
            .field(
                "confirmation_code",
                &self.confirmation_code.as_ref().map(|_| "<redacted>"),
            )
            .field("imei", &self.imei)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let code: ActivationCode = "LPA:1$smdp.example.com$04386-AGYFT-A74Y8-3F815"
            .parse()
            .unwrap();
        assert_eq!(code.smdp_address, "smdp.example.com");
        assert_eq!(code.matching_id, "04386-AGYFT-A74Y8-3F815");
        assert_eq!(code.oid, None);
        assert!(!code.confirmation_code_required);

        let code: ActivationCode = "lpa:1$smdp.example.com:8443$$1.3.6.1.4.1.31746$1"
            .parse()
            .unwrap();
        assert_eq!(code.smdp_address, "smdp.example.com:8443");
        assert_eq!(code.matching_id, "");
        assert_eq!(code.oid.as_deref(), Some("1.3.6.1.4.1.31746"));
        assert!(code.confirmation_code_required);
        assert_eq!(code.smdp_host().unwrap(), "smdp.example.com");

        let code: ActivationCode = "1$smdp.example.com$ABC$$1".parse().unwrap();
        assert_eq!(code.oid, None);
        assert!(code.confirmation_code_required);
    }

    #[test]
    fn test_parse_invalid() {
        for text in [
            "LPA:2$smdp.example.com$ABC",
            "LPA:1$$ABC",
            "LPA:1",
            "LPA:1$smdp.example.com$ABC$$2",
            "LPA:1$smdp.example.com$ABC$$1$extra",
        ] {
            assert!(
                matches!(text.parse::<ActivationCode>(), Err(Error::InvalidActivationCode(_))),
                "{text}"
            );
        }
    }

    #[test]
    fn test_display() {
        for text in [
            "LPA:1$smdp.example.com$ABC",
            "LPA:1$smdp.example.com$ABC$1.2.3",
            "LPA:1$smdp.example.com$ABC$$1",
            "LPA:1$smdp.example.com$ABC$1.2.3$1",
        ] {
            let code: ActivationCode = text.parse().unwrap();
            assert_eq!(code.to_string(), text);
        }
    }

    #[test]
    fn test_validate() {
        let code = ActivationCode::new("smdp.example.com", "ABC");
        assert!(matches!(
            code.validate(),
            Err(Error::InvalidActivationCode("missing IMEI"))
        ));
        let code = code.with_imei(Imei::new("356938035643809").unwrap());
        code.validate().unwrap();
        assert_eq!(code.smdp_url().unwrap().as_str(), "https://smdp.example.com/");

        let code = ActivationCode::default().with_imei(Imei::new("356938035643809").unwrap());
        assert!(code.validate().is_err());
    }

    #[test]
    fn test_confirmation_code_redacted() {
        let code = ActivationCode::new("smdp.example.com", "ABC").with_confirmation_code("1234");
        assert_eq!(code.confirmation_code(), "1234");
        let debug = format!("{code:?}");
        assert!(!debug.contains("1234"));
        assert!(debug.contains("<redacted>"));
        assert!(!code.to_string().contains("1234"));
    }
}
