use institute_service::config::{Config, DatabaseConfig, ServerConfig, SmsConfig};
use institute_service::Application;
use secrecy::Secret;
use serde_json::{json, Value};

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: mongodb::Database,
    pub db_name: String,
    pub client: reqwest::Client,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let db_name = format!("institute_test_{}", uuid::Uuid::new_v4());

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port
            },
            database: DatabaseConfig {
                url: Secret::new(
                    std::env::var("TEST_MONGODB_URI")
                        .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
                ),
                db_name: db_name.clone(),
            },
            sms: SmsConfig {
                gateway_url: "".to_string(),
                auth_key: Secret::new("".to_string()),
                sender_id: "TEST".to_string(),
                enabled: false,
            },
            service_name: "institute-service-test".to_string(),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let address = format!("http://127.0.0.1:{}", port);
        let db = app.db().clone();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to come up
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            db,
            db_name,
            client,
        }
    }

    pub async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.address, path))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute POST request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute GET request")
    }

    pub async fn patch(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .patch(format!("{}{}", self.address, path))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute PATCH request")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute DELETE request")
    }

    /// Create a branch and return its id.
    pub async fn create_branch(&self, name: &str, short_code: &str) -> String {
        let response = self
            .post(
                "/branches",
                json!({ "name": name, "short_code": short_code }),
            )
            .await;
        assert_eq!(response.status(), 201);
        response.json::<Value>().await.unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Create a course and return its id.
    pub async fn create_course(&self, name: &str, admission_fees: f64) -> String {
        let response = self
            .post(
                "/courses",
                json!({ "name": name, "admission_fees": admission_fees }),
            )
            .await;
        assert_eq!(response.status(), 201);
        response.json::<Value>().await.unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    /// Admit a one-time-plan student and return their id.
    pub async fn admit_student(
        &self,
        branch_id: &str,
        course_id: &str,
        total_fees: f64,
    ) -> String {
        let response = self
            .post(
                "/students",
                json!({
                    "branch_id": branch_id,
                    "course_id": course_id,
                    "name": "Asha Patel",
                    "phone": "9876543210",
                    "total_fees": total_fees,
                    "payment_plan": "OneTime"
                }),
            )
            .await;
        assert_eq!(response.status(), 201);
        response.json::<Value>().await.unwrap()["id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    pub async fn fetch_student(&self, student_id: &str) -> Value {
        let response = self.get(&format!("/students/{}", student_id)).await;
        assert_eq!(response.status(), 200);
        response.json().await.unwrap()
    }

    /// Cleanup test database after test completes.
    pub async fn cleanup(&self) {
        self.db
            .drop(None)
            .await
            .expect("Failed to drop test database");
    }
}
