use super::handlers::{auth, content, health, me, users};
use utoipa::openapi::{Contact, InfoBuilder, License, OpenApiBuilder, Tag};
use utoipa_axum::{router::OpenApiRouter, routes};

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Reuse the same router wiring and only return the generated OpenAPI spec.
    let (_router, openapi) = api_router().split_for_parts();
    openapi
}

/// Build the router that also drives the `OpenAPI` document.
///
/// Add new endpoints here via `.routes(routes!(...))` so they are both served
/// and included in the generated `OpenAPI` spec.
/// Routes added outside (like `/` or `OPTIONS /health`) are intentionally not documented.
pub(crate) fn api_router() -> OpenApiRouter {
    // `routes!` reads #[utoipa::path] to bind HTTP method + path and add the route to OpenAPI.
    OpenApiRouter::with_openapi(cargo_openapi())
        .routes(routes!(health::health))
        .routes(routes!(auth::tokens::token))
        .routes(routes!(auth::tokens::refresh_token))
        .routes(routes!(users::list_users, users::create_user))
        .routes(routes!(users::get_user))
        .routes(routes!(users::update_user_password))
        .routes(routes!(users::delete_user))
        .routes(routes!(
            content::items::list_content,
            content::items::create_content
        ))
        .routes(routes!(content::items::get_content))
        .routes(routes!(
            content::items::patch_content,
            content::items::delete_content
        ))
        .routes(routes!(me::get_me))
        .routes(routes!(me::get_settings, me::patch_settings))
}

fn cargo_openapi() -> utoipa::openapi::OpenApi {
    // Use Cargo.toml metadata instead of the utoipa-axum crate info defaults.
    let mut info = InfoBuilder::new()
        .title(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .description(optional_str(env!("CARGO_PKG_DESCRIPTION")))
        .build();

    info.contact = cargo_contact();
    info.license = cargo_license();

    OpenApiBuilder::new().info(info).tags(Some(tags())).build()
}

fn tags() -> Vec<Tag> {
    let mut health_tag = Tag::new("health");
    health_tag.description = Some("Service banner and health probes".to_string());

    let mut auth_tag = Tag::new("auth");
    auth_tag.description = Some("Password login and token refresh".to_string());

    let mut users_tag = Tag::new("users");
    users_tag.description = Some("User account administration".to_string());

    let mut content_tag = Tag::new("content");
    content_tag.description = Some("Content entries with public reads".to_string());

    let mut me_tag = Tag::new("me");
    me_tag.description = Some("Authenticated profile and settings".to_string());

    vec![health_tag, auth_tag, users_tag, content_tag, me_tag]
}

fn cargo_contact() -> Option<Contact> {
    // Cargo authors are `;` separated and may include "Name <email>".
    let authors = env!("CARGO_PKG_AUTHORS");
    let primary = authors.split(';').next().map(str::trim)?;
    if primary.is_empty() {
        return None;
    }

    let (name, email) = parse_author(primary);
    if name.is_none() && email.is_none() {
        return None;
    }

    let mut contact = Contact::new();
    contact.name = name.map(str::to_string);
    contact.email = email.map(str::to_string);
    Some(contact)
}

fn cargo_license() -> Option<License> {
    let identifier = optional_str(env!("CARGO_PKG_LICENSE"))?;
    let mut license = License::new(identifier);
    license.identifier = Some(identifier.to_string());
    Some(license)
}

fn optional_str(value: &'static str) -> Option<&'static str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

fn parse_author(author: &str) -> (Option<&str>, Option<&str>) {
    if let Some(start) = author.find('<') {
        let name = author[..start].trim();
        let email = author[start + 1..].trim_end_matches('>').trim();
        let name = if name.is_empty() { None } else { Some(name) };
        let email = if email.is_empty() { None } else { Some(email) };
        (name, email)
    } else {
        let name = author.trim();
        (if name.is_empty() { None } else { Some(name) }, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(
            spec.info.description.as_deref(),
            Some(env!("CARGO_PKG_DESCRIPTION"))
        );

        let contact = spec.info.contact;
        assert!(contact.is_some());
        if let Some(contact) = contact {
            assert_eq!(contact.name.as_deref(), Some("Team Organizer"));
            assert_eq!(contact.email.as_deref(), Some("team@organizer.dev"));
        }

        let license = spec.info.license;
        assert!(license.is_some());
        if let Some(license) = license {
            assert_eq!(license.name, "BSD-3-Clause");
            assert_eq!(license.identifier.as_deref(), Some("BSD-3-Clause"));
        }
    }

    #[test]
    fn openapi_tags_and_paths() {
        let spec = openapi();
        let tags = spec.tags.clone().unwrap_or_default();
        assert!(tags.iter().any(|tag| tag.name == "auth"));
        assert!(tags.iter().any(|tag| tag.name == "content"));
        assert!(spec.paths.paths.contains_key("/v1/token"));
        assert!(spec.paths.paths.contains_key("/v1/refresh_token"));
        assert!(spec.paths.paths.contains_key("/v1/users/{id_or_username}"));
        assert!(
            spec.paths
                .paths
                .contains_key("/v1/users/{id_or_username}/password")
        );
        assert!(spec.paths.paths.contains_key("/v1/content/{id_or_slug}"));
        assert!(spec.paths.paths.contains_key("/v1/me/settings"));
    }

    #[test]
    fn router_builds_without_route_conflicts() {
        // Axum rejects two routes whose shared position uses different
        // parameter names, so building the router doubles as a wiring check.
        let (_router, spec) = api_router().split_for_parts();
        assert!(!spec.paths.paths.is_empty());
    }
}
