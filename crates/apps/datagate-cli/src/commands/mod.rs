//! CLI command implementations.

pub mod grants;
pub mod init;
pub mod list;
pub mod show;

pub use grants::{failed_grants, pending_grants};
pub use init::init;
pub use list::{list, ListTarget};
pub use show::show;

#[cfg(test)]
pub(crate) mod test_support {
    use datagate_store::{EscrowStore, NewAccessRequest, NewGrantObligation};
    use datagate_types::{AccessRequest, RequestKey, TxHash};
    use tempfile::TempDir;

    use crate::config::CliConfig;
    use crate::context::StoreContext;

    pub fn config_in(temp_dir: &TempDir) -> CliConfig {
        let mut config = CliConfig::default();
        config.storage.data_dir = temp_dir.path().join("data");
        config
    }

    pub fn key(dataset: &str) -> RequestKey {
        RequestKey::parse("0xa11ce", "0xb0b", dataset).unwrap()
    }

    pub fn seed_request(config: &CliConfig, dataset: &str, created_at: u64) -> AccessRequest {
        let ctx = StoreContext::for_init(config).unwrap();
        ctx.store
            .insert_request(&NewAccessRequest {
                key: key(dataset),
                message: Some("for research".into()),
                price: 500,
                created_at,
            })
            .unwrap()
    }

    pub fn seed_paid(config: &CliConfig, dataset: &str, tx: &str) -> AccessRequest {
        let request = seed_request(config, dataset, 1_000);
        let ctx = StoreContext::open(config).unwrap();
        let approved = ctx
            .store
            .mark_approved(request.id, request.version, 2_000)
            .unwrap();
        ctx.store
            .mark_paid(
                approved.id,
                approved.version,
                &TxHash::parse(tx).unwrap(),
                3_000,
                &NewGrantObligation {
                    expires_at: 90_000,
                    nonce: format!("nonce-{}", dataset),
                    created_at: 3_000,
                },
            )
            .unwrap()
    }
}
