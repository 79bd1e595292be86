//! Outbound request bodies
//!
//! Payloads are plain data handed to the relay per call. The server loads
//! them once at startup from serialized defaults and an optional TOML file.
//! Licensing identifiers are digit strings with significant leading zeros,
//! so every value must be a quoted TOML string.
//!
//! ```toml
//! [credential]
//! remote_passkey = "shared-secret"
//!
//! [license]
//! nib = "1287000141282"
//! status_izin = "51"
//!
//! [license.data_pnbp]
//! nominal = "150000"
//! ```

use figment::{
    providers::{Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::path::Path;

use crate::error::{ServerError, ServerResult};

/// Top-level key of license bodies
pub const LICENSE_ENVELOPE: &str = "IZINFINAL";

/// Top-level key of credential registration bodies
pub const CREDENTIAL_ENVELOPE: &str = "credential";

pub const RECEIVE_NIB_PATH: &str = "/receive-nib";
pub const RECEIVE_FILE_IZIN_PATH: &str = "/receive-file-izin";
pub const RECEIVE_STATUS_PATH: &str = "/receive-status";

/// Extra header the hub should send along with its callbacks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomHeader {
    pub key: String,
    pub value: String,
}

/// Callback registration sent to `yanlik/remote-credential`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialPayload {
    /// Where the hub delivers NIB data
    pub remote_url: String,
    /// Where the hub delivers license files
    #[serde(rename = "remote_fileds")]
    pub remote_files: String,
    /// Where the hub delivers status changes
    pub remote_receive_status: String,
    pub remote_passkey: String,
    pub commitment_check_url: String,
    pub sso_url: String,
    #[serde(default)]
    pub custom_headers: Vec<CustomHeader>,
}

impl CredentialPayload {
    /// Empty registration pointing the hub at this gateway's callback routes
    pub fn with_callbacks(app_url: &str) -> Self {
        let base = app_url.trim_end_matches('/');
        Self {
            remote_url: format!("{}{}", base, RECEIVE_NIB_PATH),
            remote_files: format!("{}{}", base, RECEIVE_FILE_IZIN_PATH),
            remote_receive_status: format!("{}{}", base, RECEIVE_STATUS_PATH),
            ..Self::default()
        }
    }

    /// Wire body: `{"credential": {...}}`
    pub fn to_body(&self) -> JsonValue {
        json!({ CREDENTIAL_ENVELOPE: self })
    }
}

/// PNBP (non-tax state revenue) fee data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PnbpPayload {
    pub kd_akun: String,
    pub kd_penerimaan: String,
    pub nominal: String,
}

/// License decision pushed to `license-final` and `license-update`
///
/// Field names are the hub's wire names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicensePayload {
    pub nib: String,
    pub id_produk: String,
    pub id_proyek: String,
    pub oss_id: String,
    pub id_izin: String,
    pub kd_izin: String,
    pub kd_daerah: String,
    pub kewenangan: String,
    pub nomor_izin: String,
    pub tgl_terbit_izin: String,
    pub tgl_berlaku_izin: String,
    pub nama_ttd: String,
    pub nip_ttd: String,
    pub jabatan_ttd: String,
    pub status_izin: String,
    pub file_izin: String,
    pub keterangan: String,
    pub file_lampiran: String,
    pub nomenklatur_nomor_izin: String,
    pub bln_berlaku_izin: String,
    pub thn_berlaku_izin: String,
    pub data_pnbp: PnbpPayload,
}

impl LicensePayload {
    /// Wire body for `license-final`
    pub fn final_body(&self) -> JsonValue {
        json!({ LICENSE_ENVELOPE: self })
    }

    /// Wire body for `license-update`; the hub does not accept `id_produk` there
    pub fn update_body(&self) -> JsonValue {
        let mut license = json!(self);
        if let Some(fields) = license.as_object_mut() {
            fields.remove("id_produk");
        }
        json!({ LICENSE_ENVELOPE: license })
    }
}

/// All outbound payloads served by the HTTP handlers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payloads {
    pub credential: CredentialPayload,
    pub license: LicensePayload,
}

impl Payloads {
    /// Defaults: callback URLs under `app_url`, every other field empty
    pub fn defaults(app_url: &str) -> Self {
        Self {
            credential: CredentialPayload::with_callbacks(app_url),
            license: LicensePayload::default(),
        }
    }

    /// Layer an optional TOML file over the defaults
    pub fn load(path: Option<&Path>, app_url: &str) -> ServerResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::defaults(app_url)));

        if let Some(path) = path {
            if !path.exists() {
                return Err(ServerError::Config(format!(
                    "Payload file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        figment
            .extract()
            .map_err(|e| ServerError::Config(format!("Invalid outbound payloads: {}", e)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_credential_body_uses_wire_names() {
        let payload = CredentialPayload::with_callbacks("https://gateway.example/");
        let body = payload.to_body();

        assert_eq!(body["credential"]["remote_url"], "https://gateway.example/receive-nib");
        assert_eq!(
            body["credential"]["remote_fileds"],
            "https://gateway.example/receive-file-izin"
        );
        assert_eq!(
            body["credential"]["remote_receive_status"],
            "https://gateway.example/receive-status"
        );
        assert!(body["credential"]["custom_headers"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_update_body_omits_product_id() {
        let license = LicensePayload {
            nib: "1287000141282".to_string(),
            id_produk: "PRD-1".to_string(),
            ..LicensePayload::default()
        };

        let final_body = license.final_body();
        let update_body = license.update_body();

        assert_eq!(final_body["IZINFINAL"]["id_produk"], "PRD-1");
        assert!(update_body["IZINFINAL"].get("id_produk").is_none());
        assert_eq!(update_body["IZINFINAL"]["nib"], "1287000141282");
        assert!(update_body["IZINFINAL"]["data_pnbp"].get("nominal").is_some());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let payloads = Payloads::load(None, "http://localhost:8000").unwrap();
        assert_eq!(payloads, Payloads::defaults("http://localhost:8000"));
    }

    #[test]
    fn test_load_merges_toml_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[credential]
remote_passkey = "passkey"
custom_headers = [{{ key = "X-Gateway", value = "kominfo" }}]

[license]
nib = "1287000141282"
status_izin = "51"

[license.data_pnbp]
nominal = "150000"
"#
        )
        .unwrap();

        let payloads = Payloads::load(Some(file.path()), "http://gw.local").unwrap();

        assert_eq!(payloads.credential.remote_passkey, "passkey");
        assert_eq!(payloads.credential.remote_url, "http://gw.local/receive-nib");
        assert_eq!(payloads.credential.custom_headers.len(), 1);
        assert_eq!(payloads.credential.custom_headers[0].key, "X-Gateway");
        assert_eq!(payloads.license.nib, "1287000141282");
        assert_eq!(payloads.license.data_pnbp.nominal, "150000");
        assert_eq!(payloads.license.id_izin, "");
    }

    #[test]
    fn test_load_keeps_digit_strings_and_ignores_environment() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("OSSHUB_PAYLOAD_LICENSE__NIB", "999");
            jail.set_env("OSSHUB_PAYLOAD_LICENSE__DATA_PNBP__NOMINAL", "150000");
            jail.create_file(
                "payloads.toml",
                r#"
[license]
nib = "1287000141282"
kd_daerah = "0101"

[license.data_pnbp]
nominal = "150000"
"#,
            )?;

            let payloads = Payloads::load(Some(Path::new("payloads.toml")), "http://gw")
                .map_err(|e| e.to_string())?;

            assert_eq!(payloads.license.nib, "1287000141282");
            assert_eq!(payloads.license.kd_daerah, "0101");
            assert_eq!(payloads.license.data_pnbp.nominal, "150000");
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_unquoted_numbers() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[license]\nnib = 1287000141282").unwrap();

        let err = Payloads::load(Some(file.path()), "http://gw").unwrap_err();

        assert!(matches!(err, ServerError::Config(_)));
        assert!(err.to_string().contains("Invalid outbound payloads"));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = Payloads::load(Some(Path::new("/nonexistent/payloads.toml")), "http://gw")
            .unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }
}
