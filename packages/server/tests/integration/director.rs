use serde_json::json;

use crate::common::{PASSWORD, TestApp, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn admin_creates_a_director_linked_to_a_school() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school_id = app.create_school(&admin, "Director School").await;

        let res = app
            .post_with_token(
                routes::DIRECTORS,
                &json!({
                    "email": "Principal@Test.com",
                    "password": PASSWORD,
                    "name": "Pat Principal",
                    "schoolId": school_id,
                }),
                &admin,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["email"], "principal@test.com");
        assert_eq!(res.body["name"], "Pat Principal");
        assert_eq!(res.body["schoolId"], school_id.as_str());
        assert!(res.body.get("password").is_none());
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_regardless_of_case() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school_id = app.create_school(&admin, "Dup School").await;
        app.create_director(&admin, &school_id, "dup@test.com").await;

        let res = app
            .post_with_token(
                routes::DIRECTORS,
                &json!({
                    "email": "DUP@test.com",
                    "password": PASSWORD,
                    "name": "Second Director",
                    "schoolId": school_id,
                }),
                &admin,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }

    #[tokio::test]
    async fn unknown_school_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .post_with_token(
                routes::DIRECTORS,
                &json!({
                    "email": "orphan@test.com",
                    "password": PASSWORD,
                    "name": "Orphan Director",
                    "schoolId": uuid::Uuid::now_v7(),
                }),
                &admin,
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn reports_every_invalid_field() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school_id = app.create_school(&admin, "Invalid School").await;

        let res = app
            .post_with_token(
                routes::DIRECTORS,
                &json!({
                    "email": "nope",
                    "password": "short",
                    "name": "X",
                    "schoolId": school_id,
                }),
                &admin,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        let message = res.body["message"].as_str().unwrap();
        assert!(message.contains("email"), "{message}");
        assert!(message.contains("password"), "{message}");
        assert!(message.contains("name"), "{message}");
    }

    #[tokio::test]
    async fn teachers_cannot_create_directors() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;

        let res = app
            .post_with_token(
                routes::DIRECTORS,
                &json!({
                    "email": "sneaky@test.com",
                    "password": PASSWORD,
                    "name": "Sneaky",
                    "schoolId": school.school_id,
                }),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn list_can_be_filtered_by_school() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let a = app.school_with_director(&admin, "a").await;
        let b = app.school_with_director(&admin, "b").await;

        let all = app.get_with_token(routes::DIRECTORS, &admin).await;
        assert_eq!(all.status, 200, "{}", all.text);
        assert_eq!(all.body.as_array().unwrap().len(), 2);

        let res = app
            .get_with_token(&routes::directors_of_school(&a.school_id), &admin)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let list = res.body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["id"], a.director_id.as_str());
        assert_eq!(list[0]["schoolId"], a.school_id.as_str());
        assert_ne!(list[0]["id"], b.director_id.as_str());
    }

    #[tokio::test]
    async fn filtering_by_an_unknown_school_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let res = app
            .get_with_token(
                &routes::directors_of_school(&uuid::Uuid::now_v7().to_string()),
                &admin,
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn a_teacher_id_is_not_a_director() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;

        let res = app
            .get_with_token(&routes::director(&teacher.id), &admin)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Director not found");
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn email_and_name_can_change() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;

        let res = app
            .patch_with_token(
                &routes::director(&school.director_id),
                &json!({"email": "renamed@test.com", "name": "Renamed Director"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["email"], "renamed@test.com");
        assert_eq!(res.body["name"], "Renamed Director");
        assert_eq!(res.body["schoolId"], school.school_id.as_str());

        app.login("renamed@test.com", PASSWORD).await;
    }

    #[tokio::test]
    async fn keeping_the_same_email_is_allowed() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;

        let res = app
            .patch_with_token(
                &routes::director(&school.director_id),
                &json!({"email": "director-a@test.com"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
    }

    #[tokio::test]
    async fn taking_another_users_email_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let a = app.school_with_director(&admin, "a").await;
        app.school_with_director(&admin, "b").await;

        let res = app
            .patch_with_token(
                &routes::director(&a.director_id),
                &json!({"email": "director-b@test.com"}),
                &admin,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "EMAIL_TAKEN");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn removes_the_director_and_their_login() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;

        let res = app
            .delete_with_token(&routes::director(&school.director_id), &admin)
            .await;
        assert_eq!(res.status, 204, "{}", res.text);

        let get = app
            .get_with_token(&routes::director(&school.director_id), &admin)
            .await;
        assert_eq!(get.status, 404);

        let login = app
            .post_without_token(
                routes::LOGIN,
                &json!({"email": "director-a@test.com", "password": PASSWORD}),
            )
            .await;
        assert_eq!(login.status, 401);

        // The school is left without a director but still exists.
        let school_res = app
            .get_with_token(&routes::school(&school.school_id), &admin)
            .await;
        assert_eq!(school_res.status, 200);
    }
}
