//! Admin table queries.

use clearpath_types::profile::AdminProfile;

use crate::{IdentityStore, Result};

const TABLE: &str = "admin_users";

/// Find the admin row for an email, expecting at most one.
pub async fn find_by_email(
    store: &dyn IdentityStore,
    email: &str,
) -> Result<Option<AdminProfile>> {
    let rows = store.select(TABLE, &[("email", email)]).await?;
    super::decode_single(TABLE, rows)
}
