use actix_web::web;

use crate::routes::{
    create_comment, delete_comment, get_comment, list_comments, rate_comment, update_comment,
};

pub fn comment_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/comments")
            .route(web::get().to(list_comments))
            .route(web::post().to(create_comment)),
    )
    .service(
        web::resource("/comment/{id}")
            .route(web::get().to(get_comment))
            .route(web::put().to(update_comment))
            .route(web::delete().to(delete_comment)),
    )
    .service(web::resource("/comment/{id}/score").route(web::put().to(rate_comment)));
}
