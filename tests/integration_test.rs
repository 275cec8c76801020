use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use challenge_solver::config::Config;
use challenge_solver::utils::logging;
use challenge_solver::{
    AppError, AppResult, ChallengeFlow, ChallengeTask, ChromePageFetcher, ExtractionChain,
    HttpResourceFetcher, Identity, LoopSession, PageFetcher, SessionOutcome, SubmissionClient,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 预先写好的页面，按地址返回
struct StaticPages {
    pages: HashMap<String, (String, String)>,
}

impl StaticPages {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }

    fn with_page(mut self, url: &str, html: &str, text: &str) -> Self {
        self.pages
            .insert(url.to_string(), (html.to_string(), text.to_string()));
        self
    }
}

#[async_trait]
impl PageFetcher for StaticPages {
    async fn fetch_rendered_page(&self, url: &str) -> AppResult<ChallengeTask> {
        let (html, text) = self
            .pages
            .get(url)
            .ok_or_else(|| AppError::transport(url, "404 Not Found"))?;
        Ok(ChallengeTask::new(url, html.clone(), text.clone()))
    }
}

fn identity() -> Identity {
    Identity {
        email: "student@example.com".into(),
        secret: "s3cret".into(),
    }
}

#[tokio::test]
async fn test_two_page_chain_with_linked_csv() {
    logging::init(false);

    let server = MockServer::start().await;
    let base = server.uri();
    let first = format!("{}/q/1", base);
    let second = format!("{}/q/2", base);

    Mock::given(method("GET"))
        .and(path("/files/data.csv"))
        .respond_with(
            ResponseTemplate::new(200).set_body_bytes(b"Name,Total Value\nfirst,10\nsecond,20.5\nthird,n/a\n".to_vec()),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({ "url": first, "answer": 30.5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "correct": true,
            "url": second
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/submit"))
        .and(body_partial_json(json!({
            "email": "student@example.com",
            "secret": "s3cret",
            "url": second,
            "answer": 9
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "correct": true })))
        .expect(1)
        .mount(&server)
        .await;

    let pages = StaticPages::new()
        .with_page(
            &first,
            r#"<p>Download <a href="/files/data.csv">this file</a>.</p>
               <p>Post your answer to <span class="origin"></span>/submit</p>
               <form action="/submit" method="post"></form>"#,
            "Download this file. Sum the Total Value column. Post your answer to /submit",
        )
        .with_page(
            &second,
            r#"<p>Answer: 9</p><script>fetch("/submit", {method: "POST"})</script>"#,
            "Answer: 9",
        );

    let resources = Arc::new(HttpResourceFetcher::new(&Config::default()).unwrap());
    let flow = ChallengeFlow::new(
        ExtractionChain::standard(resources),
        Arc::new(SubmissionClient::new().unwrap()),
    );

    let outcome = tokio_test::assert_ok!(
        flow.run(&pages, LoopSession::new("it"), &first, &identity())
            .await
    );
    assert_eq!(outcome, SessionOutcome::Completed { hops: 1 });
}

#[tokio::test]
async fn test_rejected_submission_ends_session() {
    let server = MockServer::start().await;
    let page = format!("{}/q/1", server.uri());

    Mock::given(method("POST"))
        .and(path("/submit"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let pages = StaticPages::new().with_page(
        &page,
        r#"<form action="/submit"></form><p>nothing useful</p>"#,
        "nothing useful",
    );
    let resources = Arc::new(HttpResourceFetcher::new(&Config::default()).unwrap());
    let flow = ChallengeFlow::new(
        ExtractionChain::standard(resources),
        Arc::new(SubmissionClient::new().unwrap()),
    );

    let result = flow
        .run(&pages, LoopSession::new("it"), &page, &identity())
        .await;
    assert!(matches!(result, Err(AppError::Submit { .. })));
}

#[tokio::test]
#[ignore] // 需要本机 Chromium，手动运行：cargo test -- --ignored
async fn test_browser_renders_page() {
    logging::init(true);

    let config = Config::from_env().expect("加载配置失败");
    let pages = ChromePageFetcher::open(&config)
        .await
        .expect("启动浏览器失败");

    let result = pages
        .fetch_rendered_page("data:text/html,<p id=a></p><script>document.getElementById('a').textContent='Answer: 5'</script>")
        .await;
    pages.close().await;

    let task = result.expect("抓取页面失败");
    assert!(task.rendered_text.contains("Answer: 5"), "应该能读到脚本渲染后的文本");
}
