pub mod ingredient_amounts;
pub mod ingredients;
pub mod recipe_tags;
pub mod recipes;
pub mod tags;
pub mod users;

pub use ingredient_amounts::Entity as IngredientAmounts;
pub use ingredients::Entity as Ingredients;
pub use recipe_tags::Entity as RecipeTags;
pub use recipes::Entity as Recipes;
pub use tags::Entity as Tags;
pub use users::Entity as Users;
