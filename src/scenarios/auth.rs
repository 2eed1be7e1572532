//! AuthUser: login/logout churn with the admin credential.

use goose::prelude::*;

use super::{wait_ms, OrLog};
use crate::api::SupportClient;
use crate::config::config;

pub fn scenario() -> Result<Scenario, GooseError> {
    let (min, max) = wait_ms(5_000, 10_000);
    Ok(scenario!("AuthUser")
        .set_weight(5)?
        .set_wait_time(min, max)?
        .register_transaction(transaction!(login_logout)))
}

async fn login_logout(user: &mut GooseUser) -> TransactionResult {
    let config = config();
    let mut client = SupportClient::new(user, config);
    if let Some(auth) = client.login(&config.admin).await.or_log("auth_login") {
        client.logout(&auth).await;
    }
    Ok(())
}
