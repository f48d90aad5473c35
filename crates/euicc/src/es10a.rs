//! ES10a: addresses the card keeps for profile discovery

use nexum_bertlv::{Tag, Tlv};

use crate::constants::tags;
use crate::es10b::result_code;
use crate::transmitter::CardRequest;
use crate::{Error, Result};

/// Server addresses configured on the card
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfiguredAddresses {
    /// Default SM-DP+ address
    pub default_dp_address: Option<String>,
    /// Root SM-DS address
    pub root_ds_address: Option<String>,
}

/// `GetEuiccConfiguredAddresses` (`BF3C`)
#[derive(Debug, Clone, Copy, Default)]
pub struct GetEuiccConfiguredAddresses;

impl CardRequest for GetEuiccConfiguredAddresses {
    type Response = ConfiguredAddresses;

    fn to_tlv(&self) -> Result<Tlv> {
        Ok(Tlv::constructed(tags::EUICC_CONFIGURED_ADDRESSES, [])?)
    }

    fn parse_response(&self, response: Tlv) -> Result<ConfiguredAddresses> {
        Error::check_tag(tags::EUICC_CONFIGURED_ADDRESSES, response.tag())?;
        let address = |tag: Tag| response.child(tag).map(Tlv::decode::<String>).transpose();
        Ok(ConfiguredAddresses {
            default_dp_address: address(tags::CTX_0)?,
            root_ds_address: address(tags::CTX_1)?,
        })
    }
}

/// `SetDefaultDpAddress` (`BF3F`), empty to clear the address
#[derive(Debug, Clone, Default)]
pub struct SetDefaultDpAddress {
    /// New default SM-DP+ address
    pub address: String,
}

impl CardRequest for SetDefaultDpAddress {
    type Response = ();

    fn to_tlv(&self) -> Result<Tlv> {
        Ok(Tlv::builder(tags::SET_DEFAULT_DP_ADDRESS)
            .encode(tags::CTX_0, &self.address)
            .build()?)
    }

    fn parse_response(&self, response: Tlv) -> Result<()> {
        Error::check_tag(tags::SET_DEFAULT_DP_ADDRESS, response.tag())?;
        match result_code(&response)? {
            0 => Ok(()),
            code => Err(Error::Card {
                function: "setDefaultDpAddress",
                reason: "undefinedError",
                code,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    fn tlv(bytes: &[u8]) -> Tlv {
        Tlv::from_bytes(bytes).unwrap()
    }

    #[test]
    fn test_configured_addresses() {
        let request = GetEuiccConfiguredAddresses;
        assert_eq!(request.to_tlv().unwrap().to_bytes().unwrap(), hex!("BF3C 00"));

        let addresses = request
            .parse_response(tlv(&hex!(
                "BF3C 23"
                "80 10 736D64702E6578616D706C652E636F6D"
                "81 0F 6C70612E64732E67736D612E636F6D"
            )))
            .unwrap();
        assert_eq!(addresses.default_dp_address.as_deref(), Some("smdp.example.com"));
        assert_eq!(addresses.root_ds_address.as_deref(), Some("lpa.ds.gsma.com"));
    }

    #[test]
    fn test_configured_addresses_absent_or_invalid() {
        let request = GetEuiccConfiguredAddresses;
        assert_eq!(
            request.parse_response(tlv(&hex!("BF3C 00"))).unwrap(),
            ConfiguredAddresses::default()
        );
        assert!(matches!(
            request.parse_response(tlv(&hex!("BF3C 03 80 01 FF"))),
            Err(Error::Tlv(_))
        ));
        assert!(matches!(
            request.parse_response(tlv(&hex!("BF3F 00"))),
            Err(Error::UnexpectedTag { .. })
        ));
    }

    #[test]
    fn test_set_default_dp_address() {
        let request = SetDefaultDpAddress {
            address: "smdp.example.com".into(),
        };
        assert_eq!(
            request.to_tlv().unwrap().to_bytes().unwrap(),
            hex!("BF3F 12 80 10 736D64702E6578616D706C652E636F6D")
        );
        request.parse_response(tlv(&hex!("BF3F 03 80 01 00"))).unwrap();

        let err = request.parse_response(tlv(&hex!("BF3F 03 80 01 7F"))).unwrap_err();
        assert!(matches!(
            err,
            Error::Card {
                function: "setDefaultDpAddress",
                code: 127,
                ..
            }
        ));
        assert_eq!(err.to_string(), "setDefaultDpAddress failed: undefinedError (127)");
    }
}
