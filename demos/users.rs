//! Walks a `users` model through its lifecycle against the configured AWS account.
//!
//! Credentials and region come from the usual AWS environment. Point
//! `AWS_ENDPOINT_URL` at DynamoDB Local to try it offline.

use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::Client;
use dynamodb_model::{common, model};
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct User {
    name: Option<String>,
    email: Option<String>,
    age: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let users: model::Model<User, Client> = model::Model::new(
        Client::new(&config),
        model::ModelDescriptor {
            table_name: "users".to_string(),
            fields: vec![
                common::field::FieldSpec::indexed("name", common::field::FieldType::String),
                common::field::FieldSpec::indexed("email", common::field::FieldType::String),
                common::field::FieldSpec::new("age", common::field::FieldType::Number),
            ],
            default_limit: Some(50),
            ..Default::default()
        },
    )?;

    let created = users
        .create_many(vec![
            json!({"name": "Mohammed", "email": "mohammed@example.com", "age": 30}),
            json!({"name": "Mona", "email": "mona@example.com", "age": 25}),
        ])
        .await?;
    for user in &created {
        println!("created {} at {:?}", user.id, user.created_at);
    }

    let mut mohammed = users
        .read(&[created[0].id.as_str()], None)
        .await?
        .into_iter()
        .next()
        .ok_or("created user not found")?;
    users
        .write_record(&mut mohammed, json!({"age": 31}))
        .await?;
    println!(
        "{:?} is now {:?}, updated at {:?}",
        mohammed.fields.name, mohammed.fields.age, mohammed.updated_at
    );

    let found = users
        .search(
            vec![
                common::condition::DomainTriple::try_from((
                    "email",
                    "=",
                    "mohammed@example.com",
                ))?,
                common::condition::DomainTriple::try_from(("name", "begins_with", "Mo"))?,
            ],
            Some(&["name".to_string(), "email".to_string()]),
            None,
        )
        .await?;
    println!("{found}");
    for user in &found {
        println!("{:?} <{:?}>", user.fields.name, user.fields.email);
    }

    let ids: Vec<_> = created.iter().map(|user| user.id.as_str()).collect();
    let deleted = users.delete(&ids).await?;
    println!("deleted: {deleted}");
    Ok(())
}
