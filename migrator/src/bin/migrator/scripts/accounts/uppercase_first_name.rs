//! Renames `name` to an upper-cased `firstName` on every user account.

use migrator::{BoxError, JsonDocument, RedisJsonOperations, ScriptEnv, ScriptFuture, ScriptRegistration};
use serde_json::Value;

const SCRIPT_NAME: &str = "uppercase_first_name";
const ACCOUNT_PATTERN: &str = "accounts:*";

fn uppercase_first_name(mut document: JsonDocument) -> Result<JsonDocument, BoxError> {
    let key = document.key.clone();
    let Some(fields) = document.data.as_object_mut() else {
        return Err(format!("account {key} is not a JSON object").into());
    };

    if fields.get("type").and_then(Value::as_str) != Some("user") {
        return Ok(document);
    }

    if let Some(name) = fields.remove("name") {
        let first_name = match name {
            Value::String(name) => name.to_uppercase(),
            Value::Null => return Err(format!("account {key} has a null name").into()),
            other => other.to_string().to_uppercase(),
        };
        fields.insert("firstName".to_string(), Value::String(first_name));
    }

    Ok(document)
}

fn run(env: ScriptEnv) -> ScriptFuture {
    Box::pin(async move {
        let operations =
            RedisJsonOperations::new(env.redis.clone(), ACCOUNT_PATTERN).with_transform(uppercase_first_name);
        env.run_engine(SCRIPT_NAME, operations).await
    })
}

migrator::inventory::submit! {
    ScriptRegistration {
        name: SCRIPT_NAME,
        folder: "accounts",
        description: "Rename user accounts' name to an upper-cased firstName",
        run,
    }
}
