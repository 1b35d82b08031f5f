use auth_service::auth::{ClaimSet, extract, extract_roles, to_authorities};
use auth_service::provisioning::generate_temporary_password;
use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::hint::black_box;

fn claim_set(value: Value) -> ClaimSet {
    match value {
        Value::Object(map) => map,
        _ => unreachable!("claims are an object"),
    }
}

/// A token payload shaped like Keycloak's, with a few clients.
fn keycloak_claims(clients: usize) -> ClaimSet {
    let mut resource_access = serde_json::Map::new();
    for i in 0..clients {
        resource_access.insert(
            format!("client-{i}"),
            json!({ "roles": ["reader", "writer", format!("role-{i}")] }),
        );
    }
    claim_set(json!({
        "sub": "123e4567-e89b-12d3-a456-426614174000",
        "preferred_username": "johndoe",
        "email": "john.doe@example.com",
        "iat": 1704063600,
        "exp": 1704067200,
        "realm_access": { "roles": ["USER", "ADMIN", "offline_access", "uma_authorization"] },
        "resource_access": resource_access
    }))
}

fn benchmark_claims_extraction(c: &mut Criterion) {
    let small = keycloak_claims(1);
    let large = keycloak_claims(50);

    c.bench_function("extract_identity_small", |b| {
        b.iter(|| black_box(extract(black_box(&small))));
    });

    c.bench_function("extract_identity_50_clients", |b| {
        b.iter(|| black_box(extract(black_box(&large))));
    });

    c.bench_function("extract_roles_only", |b| {
        b.iter(|| black_box(extract_roles(black_box(&large))));
    });
}

fn benchmark_authority_mapping(c: &mut Criterion) {
    let roles = extract_roles(&keycloak_claims(50));

    c.bench_function("to_authorities", |b| {
        b.iter(|| black_box(to_authorities(black_box(&roles))));
    });

    c.bench_function("has_role_admin", |b| {
        let authorities = to_authorities(&roles);
        b.iter(|| black_box(authorities.has_role(black_box("ADMIN"))));
    });
}

fn benchmark_password_generation(c: &mut Criterion) {
    c.bench_function("generate_temporary_password", |b| {
        b.iter(|| black_box(generate_temporary_password()));
    });
}

criterion_group!(
    benches,
    benchmark_claims_extraction,
    benchmark_authority_mapping,
    benchmark_password_generation
);
criterion_main!(benches);
