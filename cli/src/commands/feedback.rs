use clap::Args;
use wipowise_core::feedback::{FeedbackRecord, Verdict};

use crate::util::{api_request, exit_error};

#[derive(Args)]
#[command(group(clap::ArgGroup::new("verdict").required(true).args(["good", "bad"])))]
pub struct FeedbackArgs {
    /// The question that was asked
    #[arg(long)]
    pub query: String,
    /// The answer being rated
    #[arg(long)]
    pub response: String,
    /// Rate the answer as good
    #[arg(long)]
    pub good: bool,
    /// What could be improved
    #[arg(long)]
    pub bad: Option<String>,
}

impl FeedbackArgs {
    fn verdict(&self) -> Verdict {
        match &self.bad {
            Some(comment) => Verdict::Negative(comment.clone()),
            None => Verdict::Positive,
        }
    }
}

pub async fn run(api_url: &str, args: FeedbackArgs) -> i32 {
    let verdict = args.verdict();
    if !verdict.is_valid() {
        exit_error(
            "--bad needs a comment",
            Some("Say what could be improved, e.g. --bad \"cite the rule\""),
            4,
        );
    }
    let record = FeedbackRecord::new(args.query, args.response, &verdict);
    let body = match serde_json::to_value(&record) {
        Ok(v) => v,
        Err(e) => exit_error(&format!("Failed to encode feedback: {e}"), None, 4),
    };
    api_request(api_url, reqwest::Method::POST, "/api/feedback", Some(body)).await
}
