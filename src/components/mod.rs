pub mod login_form;
pub mod navbar;
pub mod product_delete;
pub mod product_detail;
pub mod product_form;
pub mod products_list;
pub mod register_form;
pub mod review_form;
pub mod reviews_list;
