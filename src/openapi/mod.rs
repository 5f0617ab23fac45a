use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quote API",
        version = "1.0.0",
        description = r#"
# Quote submissions

Clients submit a quote request as one aggregate: a contact, a pickup address,
a delivery address and any number of shipment items.

## Authentication

Every `/api/client` endpoint expects a bearer JWT:

```
Authorization: Bearer <your-jwt-token>
```

## Nested attributes

Create and update accept `contact_attributes`, `pickup_address_attributes`,
`delivery_address_attributes` and `shipment_items_attributes`, optionally
wrapped in `{"quote_submission": {...}}`. A block with an `id` edits that
child, a block without one adds a child, and `_destroy` removes it.

## Validation errors

Failed validation returns 400 with only the failing children:

```json
{"error": {"contact": {"name": ["can't be blank"]}, "shipment_items": {"1": {"length": ["can't be blank"]}}}}
```
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "Quote Submissions", description = "Quote submission aggregate"),
        (name = "Health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::quote_submissions::list_quote_submissions,
        crate::handlers::quote_submissions::new_quote_submission,
        crate::handlers::quote_submissions::get_quote_submission,
        crate::handlers::quote_submissions::create_quote_submission,
        crate::handlers::quote_submissions::update_quote_submission,
        crate::handlers::quote_submissions::delete_quote_submission,
        crate::handlers::health::health_check,
    ),
    components(
        schemas(
            crate::dto::quote_submission::SubmissionResponse,
            crate::dto::quote_submission::ContactResponse,
            crate::dto::quote_submission::AddressResponse,
            crate::dto::quote_submission::ShipmentItemResponse,
            crate::entities::SubmissionStatus,
            crate::models::attributes::SubmissionAttributes,
            crate::models::attributes::ContactAttributes,
            crate::models::attributes::AddressAttributes,
            crate::models::attributes::ShipmentItemAttributes,
            crate::models::attributes::AttributeSchema,
            crate::models::nested_errors::NestedErrors,
            crate::handlers::health::HealthResponse,
            crate::handlers::health::ComponentStatus,

            // Error types
            crate::errors::ErrorResponse,
            crate::errors::NestedErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
