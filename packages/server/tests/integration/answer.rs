use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::{Value, json};

use assessment_server::entity::answer;

use crate::common::{TestApp, full_answers, question_ids, routes};

const QUESTIONS: &[(&str, &str)] = &[
    ("What went well this term?", "FREE_TEXT"),
    ("Did the new timetable help?", "MULTIPLE_CHOICE"),
];

async fn stored_answers(app: &TestApp, event_id: &str) -> u64 {
    let event_id: uuid::Uuid = event_id.parse().unwrap();
    answer::Entity::find()
        .filter(answer::Column::EventId.eq(event_id))
        .count(&app.db)
        .await
        .unwrap()
}

fn submission(event: &Value, answers: Vec<Value>) -> Value {
    json!({"eventId": event["id"], "answers": answers})
}

mod submit {
    use super::*;

    #[tokio::test]
    async fn teacher_answers_every_question() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;
        let event = app.create_event(&admin, "Term Review", QUESTIONS).await;

        let res = app
            .post_with_token(
                routes::SUBMIT,
                &submission(&event, full_answers(&event)),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["message"], "Answers submitted successfully");
        let answers = res.body["answers"].as_array().unwrap();
        assert_eq!(answers.len(), 2);
        assert!(answers.iter().all(|a| a["userId"] == teacher.id.as_str()));
        assert_eq!(answers[1]["selectedOption"], "YES");
        assert_eq!(stored_answers(&app, event["id"].as_str().unwrap()).await, 2);
    }

    #[tokio::test]
    async fn inactive_events_still_accept_answers() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;
        let event = app.create_event(&admin, "Closed Review", QUESTIONS).await;
        app.patch_with_token(
            &routes::event(event["id"].as_str().unwrap()),
            &json!({"isActive": false}),
            &admin,
        )
        .await;

        let res = app
            .post_with_token(
                routes::SUBMIT,
                &submission(&event, full_answers(&event)),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
    }

    #[tokio::test]
    async fn second_submission_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;
        let event = app.create_event(&admin, "Once Only", QUESTIONS).await;
        let body = submission(&event, full_answers(&event));

        let first = app
            .post_with_token(routes::SUBMIT, &body, &teacher.token)
            .await;
        assert_eq!(first.status, 201, "{}", first.text);

        let res = app
            .post_with_token(routes::SUBMIT, &body, &teacher.token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "ALREADY_SUBMITTED");
        assert_eq!(stored_answers(&app, event["id"].as_str().unwrap()).await, 2);
    }

    #[tokio::test]
    async fn any_later_payload_gets_already_submitted() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;
        let event = app.create_event(&admin, "Locked", QUESTIONS).await;
        let first = app
            .post_with_token(
                routes::SUBMIT,
                &submission(&event, full_answers(&event)),
                &teacher.token,
            )
            .await;
        assert_eq!(first.status, 201, "{}", first.text);

        let mut partial = full_answers(&event);
        partial.pop();
        let unknown = vec![
            json!({"questionId": uuid::Uuid::now_v7(), "answerText": "Late"}),
            json!({"questionId": uuid::Uuid::now_v7(), "answerText": "Later"}),
        ];

        for answers in [partial, unknown] {
            let res = app
                .post_with_token(routes::SUBMIT, &submission(&event, answers), &teacher.token)
                .await;

            assert_eq!(res.status, 409, "{}", res.text);
            assert_eq!(res.body["code"], "ALREADY_SUBMITTED");
        }
        assert_eq!(stored_answers(&app, event["id"].as_str().unwrap()).await, 2);
    }

    #[tokio::test]
    async fn concurrent_submissions_store_one_set() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;
        let event = app.create_event(&admin, "Race", QUESTIONS).await;
        let body = submission(&event, full_answers(&event));

        let (a, b) = tokio::join!(
            app.post_with_token(routes::SUBMIT, &body, &teacher.token),
            app.post_with_token(routes::SUBMIT, &body, &teacher.token),
        );

        let mut statuses = vec![a.status, b.status];
        statuses.sort();
        assert_eq!(statuses, vec![201, 409], "{} / {}", a.text, b.text);
        assert_eq!(stored_answers(&app, event["id"].as_str().unwrap()).await, 2);
    }

    #[tokio::test]
    async fn partial_submission_is_rejected_and_nothing_is_stored() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;
        let event = app.create_event(&admin, "Partial", QUESTIONS).await;
        let mut answers = full_answers(&event);
        answers.pop();

        let res = app
            .post_with_token(routes::SUBMIT, &submission(&event, answers), &teacher.token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert!(
            res.body["message"]
                .as_str()
                .unwrap()
                .contains("you must answer all 2 questions")
        );
        assert_eq!(stored_answers(&app, event["id"].as_str().unwrap()).await, 0);
    }

    #[tokio::test]
    async fn question_from_another_event_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;
        let event = app.create_event(&admin, "Target", QUESTIONS).await;
        let other = app.create_event(&admin, "Other", QUESTIONS).await;
        let mut answers = full_answers(&event);
        answers[0]["questionId"] = json!(question_ids(&other)[0]);

        let res = app
            .post_with_token(routes::SUBMIT, &submission(&event, answers), &teacher.token)
            .await;

        assert_eq!(res.status, 400);
        assert!(
            res.body["message"]
                .as_str()
                .unwrap()
                .contains("invalid question IDs")
        );
        assert_eq!(stored_answers(&app, event["id"].as_str().unwrap()).await, 0);
    }

    #[tokio::test]
    async fn repeated_question_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;
        let event = app.create_event(&admin, "Repeat", QUESTIONS).await;
        let ids = question_ids(&event);
        let answers = vec![
            json!({"questionId": ids[0], "answerText": "First"}),
            json!({"questionId": ids[0], "answerText": "Again"}),
        ];

        let res = app
            .post_with_token(routes::SUBMIT, &submission(&event, answers), &teacher.token)
            .await;

        assert_eq!(res.status, 400);
        assert!(
            res.body["message"]
                .as_str()
                .unwrap()
                .contains("duplicate question IDs")
        );
    }

    #[tokio::test]
    async fn answer_fields_do_not_have_to_match_the_question_type() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;
        let event = app.create_event(&admin, "Loose", QUESTIONS).await;
        let ids = question_ids(&event);
        let answers = vec![
            json!({"questionId": ids[0], "selectedOption": "NO"}),
            json!({"questionId": ids[1], "answerText": "Yes please"}),
        ];

        let res = app
            .post_with_token(routes::SUBMIT, &submission(&event, answers), &teacher.token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(stored_answers(&app, event["id"].as_str().unwrap()).await, 2);
    }

    #[tokio::test]
    async fn blank_answers_are_stored_without_text() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;
        let event = app.create_event(&admin, "Blank", QUESTIONS).await;
        let ids = question_ids(&event);
        let answers = vec![
            json!({"questionId": ids[0], "answerText": "   "}),
            json!({"questionId": ids[1]}),
        ];

        let res = app
            .post_with_token(routes::SUBMIT, &submission(&event, answers), &teacher.token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let stored = res.body["answers"].as_array().unwrap();
        assert!(stored[0]["answerText"].is_null());
        assert!(stored[1]["selectedOption"].is_null());
    }

    #[tokio::test]
    async fn empty_answer_list_is_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;
        let event = app.create_event(&admin, "Empty", QUESTIONS).await;

        let res = app
            .post_with_token(routes::SUBMIT, &submission(&event, vec![]), &teacher.token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;

        let res = app
            .post_with_token(
                routes::SUBMIT,
                &json!({
                    "eventId": uuid::Uuid::now_v7(),
                    "answers": [{"questionId": uuid::Uuid::now_v7(), "answerText": "Hi"}],
                }),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn only_teachers_can_submit() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let event = app.create_event(&admin, "Staff Only", QUESTIONS).await;

        let res = app
            .post_with_token(
                routes::SUBMIT,
                &submission(&event, full_answers(&event)),
                &school.director_token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }
}

mod teacher_views {
    use super::*;

    #[tokio::test]
    async fn history_lists_every_answer_with_its_question() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;
        let event = app.create_event(&admin, "History", QUESTIONS).await;
        app.post_with_token(
            routes::SUBMIT,
            &submission(&event, full_answers(&event)),
            &teacher.token,
        )
        .await;

        let res = app.get_with_token(routes::MY_HISTORY, &teacher.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let entries = res.body.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e["eventName"] == "History"));
        assert!(
            entries
                .iter()
                .any(|e| e["questionText"] == "What went well this term?")
        );
    }

    #[tokio::test]
    async fn participated_events_report_progress() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;
        let answered = app.create_event(&admin, "Answered", QUESTIONS).await;
        app.create_event(&admin, "Ignored", QUESTIONS).await;
        app.post_with_token(
            routes::SUBMIT,
            &submission(&answered, full_answers(&answered)),
            &teacher.token,
        )
        .await;

        let res = app
            .get_with_token(routes::MY_PARTICIPATED_EVENTS, &teacher.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        let events = res.body.as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["eventId"], answered["id"]);
        assert_eq!(events[0]["eventName"], "Answered");
        assert_eq!(events[0]["answeredQuestionsCount"], 2);
        assert_eq!(events[0]["totalQuestionsCount"], 2);
        assert_eq!(events[0]["isActive"], true);
    }

    #[tokio::test]
    async fn my_answers_are_ordered_by_question() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;
        let event = app.create_event(&admin, "Mine", QUESTIONS).await;
        let event_id = event["id"].as_str().unwrap();
        app.post_with_token(
            routes::SUBMIT,
            &submission(&event, full_answers(&event)),
            &teacher.token,
        )
        .await;

        let res = app
            .get_with_token(&routes::my_answers(event_id), &teacher.token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["eventName"], "Mine");
        let answers = res.body["answers"].as_array().unwrap();
        assert_eq!(answers[0]["questionOrder"], 1);
        assert_eq!(answers[0]["answerText"], "All good");
        assert_eq!(answers[1]["questionOrder"], 2);
        assert_eq!(answers[1]["selectedOption"], "YES");
    }

    #[tokio::test]
    async fn my_answers_for_an_unanswered_event_is_empty() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;
        let event = app.create_event(&admin, "Untouched", QUESTIONS).await;

        let res = app
            .get_with_token(
                &routes::my_answers(event["id"].as_str().unwrap()),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["answers"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn my_answers_for_an_unknown_event_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;

        let res = app
            .get_with_token(
                &routes::my_answers(&uuid::Uuid::now_v7().to_string()),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 404);
    }
}

mod director_views {
    use super::*;

    #[tokio::test]
    async fn school_results_only_include_own_teachers() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let a = app.school_with_director(&admin, "a").await;
        let b = app.school_with_director(&admin, "b").await;
        let zoe = app.teacher(&a.director_token, "zoe").await;
        let amy = app.teacher(&a.director_token, "amy").await;
        app.teacher(&a.director_token, "idle").await;
        let outsider = app.teacher(&b.director_token, "out").await;
        let event = app.create_event(&admin, "Results", QUESTIONS).await;
        let event_id = event["id"].as_str().unwrap();
        for token in [&zoe.token, &amy.token, &outsider.token] {
            let res = app
                .post_with_token(routes::SUBMIT, &submission(&event, full_answers(&event)), token)
                .await;
            assert_eq!(res.status, 201, "{}", res.text);
        }

        let res = app
            .get_with_token(&routes::school_results(event_id), &a.director_token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["schoolId"], a.school_id.as_str());
        assert_eq!(res.body["totalQuestionsCount"], 2);
        let teachers = res.body["teachers"].as_array().unwrap();
        let names: Vec<&str> = teachers
            .iter()
            .map(|t| t["teacherName"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Teacher amy", "Teacher zoe"]);
        assert_eq!(teachers[0]["teacherId"], amy.id.as_str());
        assert_eq!(teachers[0]["answeredQuestionsCount"], 2);
        assert_eq!(teachers[0]["answers"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn school_results_for_an_unknown_event_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;

        let res = app
            .get_with_token(
                &routes::school_results(&uuid::Uuid::now_v7().to_string()),
                &school.director_token,
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn teachers_cannot_read_school_results() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;
        let event = app.create_event(&admin, "Private", QUESTIONS).await;

        let res = app
            .get_with_token(
                &routes::school_results(event["id"].as_str().unwrap()),
                &teacher.token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn teacher_history_groups_answers_by_event() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;
        let teacher = app.teacher(&school.director_token, "a").await;
        let first = app.create_event(&admin, "First", QUESTIONS).await;
        let second = app
            .create_event(&admin, "Second", &[("One more thing?", "FREE_TEXT")])
            .await;
        for event in [&first, &second] {
            let res = app
                .post_with_token(
                    routes::SUBMIT,
                    &submission(event, full_answers(event)),
                    &teacher.token,
                )
                .await;
            assert_eq!(res.status, 201, "{}", res.text);
        }

        let res = app
            .get_with_token(&routes::teacher_history(&teacher.id), &school.director_token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["teacherId"], teacher.id.as_str());
        assert_eq!(res.body["teacherEmail"], "teacher-a@test.com");
        let events = res.body["events"].as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["eventName"], "Second");
        assert_eq!(events[0]["answeredQuestionsCount"], 1);
        assert_eq!(events[1]["eventName"], "First");
        assert_eq!(events[1]["answers"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn teacher_history_of_another_school_is_forbidden() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let a = app.school_with_director(&admin, "a").await;
        let b = app.school_with_director(&admin, "b").await;
        let theirs = app.teacher(&b.director_token, "theirs").await;

        let res = app
            .get_with_token(&routes::teacher_history(&theirs.id), &a.director_token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "FORBIDDEN");
    }

    #[tokio::test]
    async fn teacher_history_of_an_unknown_teacher_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;
        let school = app.school_with_director(&admin, "a").await;

        let res = app
            .get_with_token(
                &routes::teacher_history(&uuid::Uuid::now_v7().to_string()),
                &school.director_token,
            )
            .await;

        assert_eq!(res.status, 404);
    }
}

mod walkthrough {
    use super::*;

    #[tokio::test]
    async fn school_to_participated_event() {
        let app = TestApp::spawn().await;
        let admin = app.admin_token().await;

        let school_id = app.create_school(&admin, "Test School").await;
        app.create_director(&admin, &school_id, "d@x.com").await;
        let director = app.login("d@x.com", crate::common::PASSWORD).await;
        app.create_teacher(&director, "t@x.com", "Test Teacher").await;
        let teacher = app.login("t@x.com", crate::common::PASSWORD).await;

        let before = app
            .get_with_token(routes::MY_PARTICIPATED_EVENTS, &teacher)
            .await;
        assert_eq!(before.status, 200, "{}", before.text);
        assert!(before.body.as_array().unwrap().is_empty());

        let event = app.create_event(&admin, "Q1", QUESTIONS).await;
        let submit = app
            .post_with_token(
                routes::SUBMIT,
                &submission(&event, full_answers(&event)),
                &teacher,
            )
            .await;
        assert_eq!(submit.status, 201, "{}", submit.text);

        let res = app
            .get_with_token(routes::MY_PARTICIPATED_EVENTS, &teacher)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let events = res.body.as_array().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["eventName"], "Q1");
        assert_eq!(events[0]["answeredQuestionsCount"], 2);
        assert_eq!(events[0]["totalQuestionsCount"], 2);
    }
}
