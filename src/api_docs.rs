use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::user::list_users,
        api::user::get_user,
        api::tag::list_tags,
        api::tag::get_tag,
        api::ingredient::list_ingredients,
        api::ingredient::get_ingredient,
        api::recipe::list_recipes,
        api::recipe::get_recipe,
    ),
    tags(
        (name = "foodgram", description = "Foodgram recipe API")
    )
)]
pub struct ApiDoc;
