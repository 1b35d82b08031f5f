use goose::prelude::*;
use std::env;

async fn health_check(user: &mut GooseUser) -> TransactionResult {
    let _goose_metrics = user.get("/healthz").await?;
    Ok(())
}

/// Calls an authenticated endpoint with the token from `BEARER_TOKEN`.
async fn authenticated_get(user: &mut GooseUser, path: &str) -> TransactionResult {
    let token = env::var("BEARER_TOKEN").unwrap_or_default();
    let request_builder = user
        .get_request_builder(&GooseMethod::Get, path)?
        .bearer_auth(token);
    let goose_request = GooseRequest::builder()
        .set_request_builder(request_builder)
        .build();
    let _goose_metrics = user.request(goose_request).await?;
    Ok(())
}

async fn get_profile(user: &mut GooseUser) -> TransactionResult {
    authenticated_get(user, "/api/v1/profile").await
}

async fn get_token_info(user: &mut GooseUser) -> TransactionResult {
    authenticated_get(user, "/api/v1/profile/token-info").await
}

#[tokio::main]
async fn main() -> Result<(), GooseError> {
    let has_token = env::var("BEARER_TOKEN").is_ok_and(|t| !t.is_empty());
    if !has_token {
        println!("No BEARER_TOKEN environment variable set, only /healthz will be exercised");
    }

    let mut attack = GooseAttack::initialize()?.register_scenario(
        scenario!("HealthCheck").register_transaction(transaction!(health_check)),
    );

    if has_token {
        attack = attack.register_scenario(
            scenario!("Profile")
                .register_transaction(transaction!(get_profile))
                .register_transaction(transaction!(get_token_info)),
        );
    }

    attack.execute().await?;

    Ok(())
}
