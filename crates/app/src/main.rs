mod logging;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use learn_core::model::{
    DifficultyLevel, LoginRequest, NewTopic, Percent, ProgressUpdate, QuestionId, QuizSubmission,
    Registration, SessionId, Topic, TopicId, UserId,
};
use services::{ClientConfig, LearningClient, LearningState, SliceKind};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidValue { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "missing required {flag}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidValue { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

/// A command ran but the store recorded a failure.
#[derive(Debug)]
enum CommandError {
    Failed(String),
    AuthExpired,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Failed(message) => f.write_str(message),
            CommandError::AuthExpired => {
                f.write_str("session expired; run `learn login` and export the new token")
            }
        }
    }
}

impl std::error::Error for CommandError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_value<T: FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgsError> {
    let raw = require_value(args, flag)?;
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidValue { flag, raw: raw.clone() })
}

fn parse_percent(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<Percent, ArgsError> {
    let raw = require_value(args, flag)?;
    let parsed = raw
        .trim()
        .parse::<f64>()
        .ok()
        .and_then(|value| Percent::new(value).ok());
    parsed.ok_or(ArgsError::InvalidValue { flag, raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  learn topics");
    eprintln!("  learn topic <id>");
    eprintln!("  learn create --title <title> [--difficulty <level>] [--description <text>]");
    eprintln!("  learn progress");
    eprintln!("  learn stats");
    eprintln!(
        "  learn update --topic <id> [--completion <0-100>] [--score <0-100>] [--minutes <n>]"
    );
    eprintln!("  learn recommend");
    eprintln!("  learn quiz --topic <id> --answer <question>=<choice> [--answer ...]");
    eprintln!("  learn login --username <name> --password <secret>");
    eprintln!(
        "  learn register --username <name> --email <addr> --password <secret> [--difficulty <level>]"
    );
    eprintln!("  learn health");
    eprintln!("  learn session-start --topic <id>");
    eprintln!("  learn session-end --session <id> [--activities <n>]");
    eprintln!();
    eprintln!("Connection flags (any command):");
    eprintln!("  --url <base_url> --token <token> --user <id> --timeout <secs>");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARN_API_URL, LEARN_API_TOKEN, LEARN_USER_ID, LEARN_API_TIMEOUT_SECS, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Topics,
    Topic,
    Create,
    Progress,
    Stats,
    Update,
    Recommend,
    Quiz,
    Login,
    Register,
    Health,
    SessionStart,
    SessionEnd,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "topics" => Some(Self::Topics),
            "topic" => Some(Self::Topic),
            "create" => Some(Self::Create),
            "progress" => Some(Self::Progress),
            "stats" => Some(Self::Stats),
            "update" => Some(Self::Update),
            "recommend" => Some(Self::Recommend),
            "quiz" => Some(Self::Quiz),
            "login" => Some(Self::Login),
            "register" => Some(Self::Register),
            "health" => Some(Self::Health),
            "session-start" => Some(Self::SessionStart),
            "session-end" => Some(Self::SessionEnd),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    url: Option<String>,
    token: Option<String>,
    user: Option<UserId>,
    timeout: Option<Duration>,
    positional: Option<String>,
    title: Option<String>,
    difficulty: Option<DifficultyLevel>,
    description: Option<String>,
    topic: Option<TopicId>,
    completion: Option<Percent>,
    score: Option<Percent>,
    minutes: Option<u32>,
    answers: Vec<(QuestionId, String)>,
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
    session: Option<SessionId>,
    activities: Option<u32>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--url" => parsed.url = Some(require_value(args, "--url")?),
                "--token" => parsed.token = Some(require_value(args, "--token")?),
                "--user" => parsed.user = Some(parse_value(args, "--user")?),
                "--timeout" => {
                    let secs: u64 = parse_value(args, "--timeout")?;
                    if secs == 0 {
                        return Err(ArgsError::InvalidValue {
                            flag: "--timeout",
                            raw: secs.to_string(),
                        });
                    }
                    parsed.timeout = Some(Duration::from_secs(secs));
                }
                "--title" => parsed.title = Some(require_value(args, "--title")?),
                "--difficulty" => parsed.difficulty = Some(parse_value(args, "--difficulty")?),
                "--description" => {
                    parsed.description = Some(require_value(args, "--description")?);
                }
                "--topic" => parsed.topic = Some(parse_value(args, "--topic")?),
                "--completion" => parsed.completion = Some(parse_percent(args, "--completion")?),
                "--score" => parsed.score = Some(parse_percent(args, "--score")?),
                "--minutes" => parsed.minutes = Some(parse_value(args, "--minutes")?),
                "--answer" => {
                    let raw = require_value(args, "--answer")?;
                    let answer = raw
                        .split_once('=')
                        .and_then(|(question, choice)| {
                            Some((question.parse::<QuestionId>().ok()?, choice.to_string()))
                        })
                        .ok_or_else(|| ArgsError::InvalidValue {
                            flag: "--answer",
                            raw: raw.clone(),
                        })?;
                    parsed.answers.push(answer);
                }
                "--username" => parsed.username = Some(require_value(args, "--username")?),
                "--email" => parsed.email = Some(require_value(args, "--email")?),
                "--password" => parsed.password = Some(require_value(args, "--password")?),
                "--session" => parsed.session = Some(parse_value(args, "--session")?),
                "--activities" => parsed.activities = Some(parse_value(args, "--activities")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                other if !other.starts_with("--") && parsed.positional.is_none() => {
                    parsed.positional = Some(arg);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    /// Command-line flags win over the environment.
    fn apply_to(&self, config: &mut ClientConfig) {
        if let Some(url) = &self.url {
            config.base_url.clone_from(url);
        }
        if let Some(token) = &self.token {
            config.token = Some(token.clone());
        }
        if let Some(user) = &self.user {
            config.user_id = Some(user.clone());
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
    }

    fn topic_id(&self) -> Result<TopicId, ArgsError> {
        if let Some(id) = &self.topic {
            return Ok(id.clone());
        }
        let raw = self
            .positional
            .clone()
            .ok_or(ArgsError::MissingFlag { flag: "--topic" })?;
        raw.parse().map_err(|_| ArgsError::InvalidValue {
            flag: "--topic",
            raw: raw.clone(),
        })
    }

    fn required(value: Option<&String>, flag: &'static str) -> Result<String, ArgsError> {
        value.cloned().ok_or(ArgsError::MissingFlag { flag })
    }
}

fn user_of(client: &LearningClient) -> Result<UserId, ArgsError> {
    client
        .user_id()
        .cloned()
        .ok_or(ArgsError::MissingFlag { flag: "--user" })
}

/// Read the latest snapshot, surfacing (and clearing) any error the last
/// operation left on `kind`.
fn settled(client: &LearningClient, kind: SliceKind) -> Result<Arc<LearningState>, CommandError> {
    let store = client.store();
    if store.snapshot().auth_expired {
        return Err(CommandError::AuthExpired);
    }
    if let Some(message) = store.take_error(kind) {
        return Err(CommandError::Failed(message));
    }
    Ok(store.snapshot())
}

fn print_topic(topic: &Topic) {
    let progress = topic
        .completion()
        .map_or_else(|| "not started".to_string(), |pct| pct.to_string());
    println!(
        "{}\t{}\t{}\t{}",
        topic.id, topic.title, topic.difficulty_level, progress
    );
}

async fn execute(
    cmd: Command,
    args: &Args,
    client: &mut LearningClient,
) -> Result<(), Box<dyn std::error::Error>> {
    let dispatcher = client.dispatcher().clone();

    match cmd {
        Command::Topics => {
            let _ = dispatcher.fetch_user_topics().await;
            let state = settled(client, SliceKind::Topics)?;
            if state.topics.data.list.is_empty() {
                println!("no topics yet");
            }
            state.topics.data.list.iter().for_each(print_topic);
        }
        Command::Topic => {
            let _ = dispatcher.fetch_topic(args.topic_id()?).await;
            let state = settled(client, SliceKind::Topics)?;
            if let Some(topic) = &state.topics.data.current {
                print_topic(topic);
                if let Some(summary) = &topic.content.summary {
                    println!("\n{summary}");
                }
                for (index, quiz) in topic.quizzes.iter().enumerate() {
                    println!("\nQ{} [{}] {}", index + 1, quiz.id, quiz.question);
                    for option in &quiz.options {
                        println!("  - {option}");
                    }
                }
            }
        }
        Command::Create => {
            let title = Args::required(args.title.as_ref(), "--title")?;
            let mut request = NewTopic::new(title, args.difficulty.unwrap_or_default());
            if let Some(description) = &args.description {
                request = request.with_description(description.clone());
            }
            let _ = dispatcher.create_topic(request).await;
            let state = settled(client, SliceKind::Topics)?;
            if let Some(topic) = &state.topics.data.current {
                print_topic(topic);
            }
        }
        Command::Progress => {
            let _ = dispatcher.fetch_user_progress(user_of(client)?).await;
            let state = settled(client, SliceKind::Progress)?;
            for record in &state.progress.data {
                println!(
                    "{}\t{}\tcompleted {}\tscore {}\t{} min",
                    record.topic_id,
                    record.topic_title.as_deref().unwrap_or("-"),
                    record.completion_percentage,
                    record.quiz_score,
                    record.time_spent
                );
            }
        }
        Command::Stats => {
            let _ = dispatcher.fetch_user_progress(user_of(client)?).await;
            let stats = settled(client, SliceKind::Progress)?.stats();
            println!("topics studied: {}", stats.total_topics);
            println!("average score:  {:.1}", stats.average_score);
            println!("time spent:     {} min", stats.total_time);
        }
        Command::Update => {
            let mut update = ProgressUpdate::for_topic(args.topic_id()?);
            update.completion_percentage = args.completion;
            update.quiz_score = args.score;
            update.time_spent = args.minutes;
            if update.is_empty() {
                return Err(ArgsError::MissingFlag {
                    flag: "--completion, --score or --minutes",
                }
                .into());
            }
            let topic_id = update.topic_id.clone();

            // Load the cached record first so the merged result can be shown.
            if let Some(user) = client.user_id().cloned() {
                let _ = dispatcher.fetch_user_progress(user).await;
                settled(client, SliceKind::Progress)?;
            }
            let _ = dispatcher.update_progress(update).await;
            let state = settled(client, SliceKind::Progress)?;
            match state.progress.data.iter().find(|r| r.topic_id == topic_id) {
                Some(record) => println!(
                    "{}\tcompleted {}\tscore {}\t{} min",
                    record.topic_id,
                    record.completion_percentage,
                    record.quiz_score,
                    record.time_spent
                ),
                None => println!("progress updated for topic {topic_id}"),
            }
        }
        Command::Recommend => {
            let _ = dispatcher.fetch_recommendations(user_of(client)?).await;
            let state = settled(client, SliceKind::Recommendations)?;
            if state.recommendations.data.is_empty() {
                println!("no recommendations yet");
            }
            for (rank, title) in state.recommendations.data.topics.iter().enumerate() {
                println!("{}. {title}", rank + 1);
            }
        }
        Command::Quiz => {
            let submission = args
                .answers
                .iter()
                .cloned()
                .fold(QuizSubmission::new(args.topic_id()?), |s, (q, choice)| {
                    s.answer(q, choice)
                });
            let _ = dispatcher.submit_quiz(submission).await;
            let state = settled(client, SliceKind::Quiz)?;
            if let Some(result) = &state.quiz.data {
                println!(
                    "score {} ({}/{} correct)",
                    result.score, result.correct_answers, result.total_questions
                );
                for miss in result.incorrect() {
                    println!(
                        "  [{}] {} -> expected {}",
                        miss.question_id,
                        miss.question,
                        miss.correct_answer
                    );
                }
            }
        }
        Command::Login => {
            let request = LoginRequest {
                username: Args::required(args.username.as_ref(), "--username")?,
                password: Args::required(args.password.as_ref(), "--password")?,
            };
            let session = client.login(&request).await?;
            println!("signed in as {} (user {})", session.user.username, session.user.id);
            println!("LEARN_API_TOKEN={}", session.access_token);
        }
        Command::Register => {
            let registration = Registration {
                username: Args::required(args.username.as_ref(), "--username")?,
                email: Args::required(args.email.as_ref(), "--email")?,
                password: Args::required(args.password.as_ref(), "--password")?,
                learning_level: args.difficulty.unwrap_or_default(),
            };
            let session = client.register(&registration).await?;
            println!("registered {} (user {})", session.user.username, session.user.id);
            println!("LEARN_API_TOKEN={}", session.access_token);
        }
        Command::Health => {
            let health = client.health().await?;
            match health.message {
                Some(message) => println!("{}: {message}", health.status),
                None => println!("{}", health.status),
            }
        }
        Command::SessionStart => {
            let started = client.start_session(args.topic_id()?).await?;
            println!("session {} started at {}", started.session_id, started.start_time);
        }
        Command::SessionEnd => {
            let session_id = args
                .session
                .clone()
                .ok_or(ArgsError::MissingFlag { flag: "--session" })?;
            let ended = client
                .end_session(session_id, args.activities.unwrap_or(0))
                .await?;
            match ended.duration {
                Some(minutes) => println!(
                    "session ended after {minutes} min, {} activities",
                    ended.activities_completed
                ),
                None => println!(
                    "session ended, {} activities",
                    ended.activities_completed
                ),
            }
        }
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    logging::init();

    let mut config = ClientConfig::from_env()?;
    args.apply_to(&mut config);
    let mut client = LearningClient::connect(&config)?;
    tracing::debug!(?cmd, base_url = %config.base_url, "running command");

    let outcome = execute(cmd, &args, &mut client).await;
    client.dispose();
    outcome
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(&mut raw.iter().map(|s| (*s).to_string()))
    }

    #[test]
    fn parses_update_flags() {
        let args = parse(&["--topic", "4", "--completion", "100", "--minutes", "12"]).unwrap();

        assert_eq!(args.topic_id().unwrap(), TopicId::from(4));
        assert_eq!(args.completion, Some(Percent::FULL));
        assert_eq!(args.minutes, Some(12));
        assert_eq!(args.score, None);
    }

    #[test]
    fn positional_topic_id_is_accepted() {
        let args = parse(&["17"]).unwrap();
        assert_eq!(args.topic_id().unwrap(), TopicId::from(17));
    }

    #[test]
    fn rejects_out_of_range_percent() {
        assert!(matches!(
            parse(&["--score", "140"]),
            Err(ArgsError::InvalidValue { flag: "--score", .. })
        ));
    }

    #[test]
    fn collects_quiz_answers() {
        let args = parse(&["--topic", "1", "--answer", "3=B", "--answer", "4=D"]).unwrap();

        assert_eq!(
            args.answers,
            vec![
                (QuestionId::from(3), "B".to_string()),
                (QuestionId::from(4), "D".to_string())
            ]
        );
        assert!(matches!(
            parse(&["--answer", "no-separator"]),
            Err(ArgsError::InvalidValue { flag: "--answer", .. })
        ));
    }

    #[test]
    fn flags_override_environment_config() {
        let args = parse(&["--url", "http://10.0.0.2:5000", "--user", "9", "--timeout", "3"])
            .unwrap();
        let mut config = ClientConfig::default();

        args.apply_to(&mut config);

        assert_eq!(config.base_url, "http://10.0.0.2:5000");
        assert_eq!(config.user_id, Some(UserId::from(9)));
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn missing_value_and_unknown_flags_fail() {
        assert!(matches!(
            parse(&["--title"]),
            Err(ArgsError::MissingValue { flag: "--title" })
        ));
        assert!(matches!(parse(&["--bogus"]), Err(ArgsError::UnknownArg(_))));
    }
}
