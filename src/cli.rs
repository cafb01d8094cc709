use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;

use crate::api::images::{extract_file_ids, extract_image_urls};
use crate::api::search::SearchOptions;
use crate::api::ZentaoClient;
use crate::config::{self, Credentials};
use crate::error::ZentaoError;
use crate::model::bug::{BugResolution, ResolutionKind};
use crate::model::story::StoryStatus;
use crate::model::task::{TaskStatus, TaskUpdate};
use crate::model::testing::{NewTestCase, RunResult, TestCaseStatus, TestRun};
use crate::util::{analyze, format, suggest};

/// zentao — command line client for ZenTao 11.x
#[derive(Parser, Debug)]
#[command(name = "zentao", version, about, long_about = None)]
pub struct Cli {
    /// Log requests and pages to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Save server credentials to ~/.zentao/config.toml
    Init {
        url: String,
        username: String,
        password: String,
    },
    /// Show the active credentials, password masked
    Config,

    /// List products
    Products,

    /// List my tasks
    Tasks,
    /// Show a task
    Task {
        id: u64,
        #[arg(long)]
        markdown: bool,
    },
    /// Record effort or change a task's status
    TaskUpdate {
        id: u64,
        #[command(flatten)]
        update: TaskUpdateArgs,
    },
    /// Mark a task done
    TaskFinish {
        id: u64,
        #[arg(long)]
        consumed: Option<f64>,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Apply one update to several tasks
    BatchUpdateTasks {
        #[arg(required = true, value_delimiter = ',')]
        ids: Vec<u64>,
        #[command(flatten)]
        update: TaskUpdateArgs,
    },
    /// Task counts by status and priority
    TaskStats,

    /// List my bugs
    Bugs,
    /// Show a bug
    Bug {
        id: u64,
        #[arg(long)]
        markdown: bool,
        /// Download images embedded in the steps
        #[arg(long)]
        images: bool,
    },
    /// Resolve a bug
    BugResolve {
        id: u64,
        #[command(flatten)]
        resolution: ResolutionArgs,
    },
    /// Resolve several bugs the same way
    BatchResolveBugs {
        #[arg(required = true, value_delimiter = ',')]
        ids: Vec<u64>,
        #[command(flatten)]
        resolution: ResolutionArgs,
    },
    /// Bug counts by status and severity
    BugStats,

    /// List a product's stories
    Stories {
        product: u64,
        #[arg(long, value_enum)]
        status: Option<StoryStatus>,
    },
    /// Show a story
    Story {
        id: u64,
        #[arg(long)]
        markdown: bool,
        /// Download images embedded in the description
        #[arg(long)]
        images: bool,
    },
    /// Search story titles and descriptions
    Search {
        keyword: String,
        #[arg(long)]
        product: Option<u64>,
        #[arg(long, value_enum)]
        status: Option<StoryStatus>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Search stories of products whose name matches
    SearchByProduct {
        product_name: String,
        keyword: String,
        #[arg(long, value_enum)]
        status: Option<StoryStatus>,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List a product's test cases
    Testcases {
        product: u64,
        #[arg(long, value_enum)]
        status: Option<TestCaseStatus>,
        #[arg(long)]
        module: Option<u64>,
    },
    /// Show a test case
    Testcase { id: u64 },
    /// Create a test case
    TestcaseCreate {
        product: u64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        story: Option<u64>,
        #[arg(long)]
        module: Option<u64>,
        #[arg(long = "type")]
        case_type: Option<String>,
        #[arg(long)]
        pri: Option<u32>,
        #[arg(long)]
        precondition: Option<String>,
        #[arg(long)]
        steps: Option<String>,
    },
    /// Test cases linked to a story
    StoryTestcases { story: u64 },

    /// List test tasks, mine or a product's
    Testtasks {
        #[arg(long)]
        product: Option<u64>,
    },
    /// Show a test task
    Testtask { id: u64 },
    /// Case runs inside a test task
    TesttaskResults { id: u64 },
    /// Record the result of running a case
    RunCase {
        task: u64,
        case: u64,
        #[arg(long, value_enum)]
        result: RunResult,
        #[arg(long)]
        version: Option<u32>,
        #[arg(long)]
        steps: Option<String>,
        #[arg(long)]
        comment: Option<String>,
    },

    /// Bugs raised against a story
    StoryBugs { story: u64 },
    /// The story a bug belongs to
    BugStory { bug: u64 },

    /// Score complexity, priority or workload
    Analyze {
        #[command(subcommand)]
        target: Target,
    },
    /// Suggest next steps
    Suggest {
        #[command(subcommand)]
        target: Target,
        /// Print JSON instead of Markdown
        #[arg(long)]
        json: bool,
    },
    /// One-line summary
    Summary {
        #[command(subcommand)]
        target: Target,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Story { id: u64 },
    Bug { id: u64 },
    Task { id: u64 },
}

#[derive(Args, Debug, Clone)]
pub struct TaskUpdateArgs {
    #[arg(long)]
    pub consumed: Option<f64>,
    #[arg(long)]
    pub left: Option<f64>,
    #[arg(long, value_enum)]
    pub status: Option<TaskStatus>,
    #[arg(long)]
    pub comment: Option<String>,
}

impl From<TaskUpdateArgs> for TaskUpdate {
    fn from(args: TaskUpdateArgs) -> Self {
        TaskUpdate {
            consumed: args.consumed,
            left: args.left,
            status: args.status,
            finished_date: None,
            comment: args.comment,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ResolutionArgs {
    #[arg(long, value_enum)]
    pub resolution: ResolutionKind,
    #[arg(long)]
    pub build: Option<String>,
    /// Original bug when resolving as a duplicate
    #[arg(long)]
    pub duplicate: Option<u64>,
    #[arg(long)]
    pub comment: Option<String>,
}

impl From<ResolutionArgs> for BugResolution {
    fn from(args: ResolutionArgs) -> Self {
        BugResolution {
            resolution: args.resolution,
            resolved_build: args.build,
            duplicate_bug: args.duplicate,
            comment: args.comment,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn connect() -> Result<ZentaoClient> {
    let credentials = config::load()?.ok_or_else(|| {
        ZentaoError::Config(format!(
            "no credentials: set ZENTAO_URL, ZENTAO_USERNAME and ZENTAO_PASSWORD or write {}",
            config::config_path().display()
        ))
    })?;
    Ok(ZentaoClient::connect(credentials)?)
}

pub async fn run(command: Command) -> Result<()> {
    match command {
        Command::Init {
            url,
            username,
            password,
        } => {
            let credentials = Credentials::new(&url, &username, &password);
            config::save(&credentials).context("Failed to save credentials")?;
            println!("Saved credentials to {}", config::config_path().display());
            Ok(())
        }
        Command::Config => match config::load()? {
            Some(credentials) => print_json(&credentials.masked()),
            None => Err(ZentaoError::Config("no credentials configured".into()).into()),
        },
        command => run_remote(&connect()?, command).await,
    }
}

async fn run_remote(client: &ZentaoClient, command: Command) -> Result<()> {
    match command {
        Command::Init { .. } | Command::Config => Ok(()),

        Command::Products => print_json(&client.products().await?),

        Command::Tasks => print_json(&client.my_tasks().await?),
        Command::Task { id, markdown } => {
            let task = client.task(id).await?;
            if markdown {
                println!("{}", format::task_markdown(&task));
                Ok(())
            } else {
                print_json(&task)
            }
        }
        Command::TaskUpdate { id, update } => {
            print_json(&client.update_task(id, &update.into()).await?)
        }
        Command::TaskFinish {
            id,
            consumed,
            date,
            comment,
        } => {
            let update = TaskUpdate {
                consumed,
                finished_date: date,
                comment,
                ..Default::default()
            };
            print_json(&client.finish_task(id, &update).await?)
        }
        Command::BatchUpdateTasks { ids, update } => {
            print_json(&client.batch_update_tasks(&ids, &update.into()).await)
        }
        Command::TaskStats => print_json(&client.task_statistics().await?),

        Command::Bugs => print_json(&client.my_bugs().await?),
        Command::Bug {
            id,
            markdown,
            images,
        } => {
            let bug = client.bug(id).await?;
            if markdown {
                println!("{}", format::bug_markdown(&bug));
                return Ok(());
            }
            if images {
                let downloaded = client.download_images(&extract_image_urls(&bug.steps)).await;
                let file_ids = extract_file_ids(&bug.steps);
                return print_json(
                    &json!({ "bug": bug, "images": downloaded, "fileIds": file_ids }),
                );
            }
            print_json(&bug)
        }
        Command::BugResolve { id, resolution } => {
            print_json(&client.resolve_bug(id, &resolution.into()).await?)
        }
        Command::BatchResolveBugs { ids, resolution } => {
            print_json(&client.batch_resolve_bugs(&ids, &resolution.into()).await)
        }
        Command::BugStats => print_json(&client.bug_statistics().await?),

        Command::Stories { product, status } => {
            print_json(&client.fetch_all_stories(product, status).await?)
        }
        Command::Story {
            id,
            markdown,
            images,
        } => {
            let story = client.story(id).await?;
            if markdown {
                println!("{}", format::story_markdown(&story));
                return Ok(());
            }
            if images {
                let downloaded = client.download_images(&extract_image_urls(&story.spec)).await;
                let file_ids = extract_file_ids(&story.spec);
                return print_json(
                    &json!({ "story": story, "images": downloaded, "fileIds": file_ids }),
                );
            }
            print_json(&story)
        }
        Command::Search {
            keyword,
            product,
            status,
            limit,
        } => {
            let options = SearchOptions {
                product_id: product,
                status,
                limit,
            };
            print_json(&client.search(&keyword, &options).await?)
        }
        Command::SearchByProduct {
            product_name,
            keyword,
            status,
            limit,
        } => {
            let options = SearchOptions {
                product_id: None,
                status,
                limit,
            };
            print_json(
                &client
                    .search_by_product_name(&product_name, &keyword, &options)
                    .await?,
            )
        }

        Command::Testcases {
            product,
            status,
            module,
        } => print_json(&client.product_test_cases(product, status, module).await?),
        Command::Testcase { id } => print_json(&client.test_case(id).await?),
        Command::TestcaseCreate {
            product,
            title,
            story,
            module,
            case_type,
            pri,
            precondition,
            steps,
        } => {
            let case = NewTestCase {
                product,
                module,
                story,
                title,
                case_type,
                pri,
                precondition,
                steps,
                status: None,
            };
            let id = client.create_test_case(&case).await?;
            print_json(&json!({ "success": true, "id": id }))
        }
        Command::StoryTestcases { story } => print_json(&client.story_test_cases(story).await?),

        Command::Testtasks { product } => print_json(&client.test_tasks(product).await?),
        Command::Testtask { id } => print_json(&client.test_task(id).await?),
        Command::TesttaskResults { id } => print_json(&client.test_task_results(id).await?),
        Command::RunCase {
            task,
            case,
            result,
            version,
            steps,
            comment,
        } => {
            let run = TestRun {
                case_id: case,
                version,
                result,
                steps,
                comment,
            };
            client.run_test_case(task, &run).await?;
            print_json(&json!({ "success": true, "task": task, "case": case }))
        }

        Command::StoryBugs { story } => print_json(&client.bugs_for_story(story).await?),
        Command::BugStory { bug } => print_json(&client.story_for_bug(bug).await?),

        Command::Analyze { target } => match target {
            Target::Story { id } => {
                let story = client.story(id).await?;
                let bugs = client.bugs_for_story(id).await?;
                let cases = client.story_test_cases(id).await?;
                print_json(&analyze::story_complexity(&story, bugs.items.len(), cases.len()))
            }
            Target::Bug { id } => {
                let bug = client.bug(id).await?;
                let has_story = bug.story.is_some();
                print_json(&analyze::bug_priority(&bug, has_story))
            }
            Target::Task { id } => print_json(&analyze::task_workload(&client.task(id).await?)),
        },
        Command::Suggest { target, json } => {
            let suggestions = match target {
                Target::Story { id } => {
                    let story = client.story(id).await?;
                    let bugs = client.bugs_for_story(id).await?;
                    let cases = client.story_test_cases(id).await?;
                    suggest::for_story(&story, !bugs.items.is_empty(), !cases.is_empty())
                }
                Target::Bug { id } => {
                    let bug = client.bug(id).await?;
                    let has_story = bug.story.is_some();
                    suggest::for_bug(&bug, has_story)
                }
                Target::Task { id } => suggest::for_task(&client.task(id).await?),
            };
            if json {
                print_json(&suggestions)
            } else {
                println!("{}", suggest::to_markdown(&suggestions));
                Ok(())
            }
        }
        Command::Summary { target } => {
            let line = match target {
                Target::Story { id } => format::story_summary(&client.story(id).await?),
                Target::Bug { id } => format::bug_summary(&client.bug(id).await?),
                Target::Task { id } => {
                    let task = client.task(id).await?;
                    format!("Task #{}: {} | status: {}", task.id, task.name, task.status)
                }
            };
            println!("{line}");
            Ok(())
        }
    }
}
