//! User tools.

use asgardeo::{ManagementApi, NewUser};
use mcp::{InputSchema, Tool};
use tracing::info;

use crate::args::Arguments;
use crate::error::Result;
use crate::pretty;

const DEFAULT_USERSTORE: &str = "DEFAULT";

pub(crate) fn tools(product: &str) -> Vec<Tool> {
    vec![Tool::new(
        "create_user",
        format!("Create a user in {product}"),
        InputSchema::new()
            .string(
                "username",
                "This is the username of the user. This should be an email address.",
            )
            .string("password", "This is the password of the user. Eg; atGHL1234#")
            .string("email", "This is the email of the user.")
            .string("first_name", "This is the first name of the user.")
            .string("last_name", "This is the last name of the user.")
            .string_with_default(
                "userstore_domain",
                "This is the userstore domain of the user.",
                DEFAULT_USERSTORE,
            )
            .required("username")
            .required("password")
            .required("email")
            .required("first_name")
            .required("last_name"),
    )]
}

pub(crate) async fn create<C: ManagementApi>(client: &C, args: &Arguments) -> Result<String> {
    let username: String = args.required("username")?;
    let domain = args.optional_or("userstore_domain", DEFAULT_USERSTORE.to_string());

    let user = NewUser {
        username: format!("{domain}/{username}"),
        password: args.required("password")?,
        email: args.required("email")?,
        first_name: args.required("first_name")?,
        last_name: args.required("last_name")?,
    };

    let created = client.create_user(&user).await?;
    info!(username = %user.username, "user created");
    pretty(&created)
}
