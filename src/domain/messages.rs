//! Client-facing messages for membership and subscription failures.

pub const RECIPE_ALREADY_ADDED: &str = "Этот рецепт уже добавлен";
pub const RECIPE_NOT_IN_LIST: &str = "Что мертво умереть не может";

pub const ALREADY_SUBSCRIBED: &str = "Вы уже подписаны на этого автора";
pub const NOT_SUBSCRIBED: &str = "Вы не были подписаны на этого автора";
pub const SELF_SUBSCRIPTION: &str = "Нельзя подписаться на самого себя";

pub const SHOPPING_LIST_EMPTY: &str = "Список покупок пуст";

pub const DATA_FILE_NOT_FOUND: &str = "Не найден json файл в директории";
pub const DATA_LOADED: &str = "Данные добавлены в базу";
