pub mod comment_post_route;
pub mod get_posts;
pub mod like_post_route;
pub mod login_route;
pub mod publish_post;
pub mod register_route;
