use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/schools", school_routes())
        .nest("/directors", director_routes())
        .nest("/teachers", teacher_routes())
        .nest("/events", event_routes())
        .nest("/answers", answer_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::me))
}

fn school_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::school::create_school,
            handlers::school::list_schools
        ))
        .routes(routes!(
            handlers::school::get_school,
            handlers::school::update_school,
            handlers::school::delete_school
        ))
}

fn director_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::director::create_director,
            handlers::director::list_directors
        ))
        .routes(routes!(
            handlers::director::get_director,
            handlers::director::update_director,
            handlers::director::delete_director
        ))
}

fn teacher_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::teacher::create_teacher,
            handlers::teacher::list_teachers
        ))
        .routes(routes!(
            handlers::teacher::get_teacher,
            handlers::teacher::update_teacher,
            handlers::teacher::delete_teacher
        ))
}

fn event_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::event::create_event,
            handlers::event::list_events
        ))
        .routes(routes!(
            handlers::event::get_event,
            handlers::event::update_event,
            handlers::event::delete_event
        ))
}

fn answer_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::answer::submit_answers))
        .routes(routes!(handlers::answer::my_history))
        .routes(routes!(handlers::answer::my_participated_events))
        .routes(routes!(handlers::answer::my_answers))
        .routes(routes!(handlers::answer::school_results))
        .routes(routes!(handlers::answer::teacher_history))
}
