//! End-to-end tests for plan execution and exit-code mapping.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;

use climate::{
    func, run, structure, Args, CancellationToken, Context, Plan, Receiver, RunOptions,
};

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

fn run_args(plan: &dyn Plan, argv: &[&str]) -> i32 {
    run(
        &CancellationToken::new(),
        plan,
        RunOptions::default().args(argv.iter().copied()),
    )
}

#[derive(clap::Args, Default)]
struct Opts {
    #[arg(long, default_value = "anon")]
    name: String,
}

// =============================================================================
// Role combinations
// =============================================================================

mod role_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_roles() {
        let calls = log();
        let l = calls.clone();
        let plan = func(move || l.lock().unwrap().push("called".into())).unwrap();
        assert_eq!(run_args(&plan, &["app"]), 0);
        assert_eq!(entries(&calls), vec!["called"]);
    }

    #[test]
    fn test_context_only() {
        let calls = log();
        let l = calls.clone();
        let plan = func(move |ctx: Context| {
            l.lock().unwrap().push(format!("ctx:{}", ctx.path().join("/")));
        })
        .unwrap();
        assert_eq!(run_args(&plan, &["/usr/bin/app"]), 0);
        assert_eq!(entries(&calls), vec!["ctx:app"]);
    }

    #[test]
    fn test_options_only() {
        let calls = log();
        let l = calls.clone();
        let plan = func(move |opts: Opts| l.lock().unwrap().push(format!("opts:{}", opts.name)))
            .unwrap();
        assert_eq!(run_args(&plan, &["app", "--name", "ada"]), 0);
        assert_eq!(run_args(&plan, &["app"]), 0);
        assert_eq!(entries(&calls), vec!["opts:ada", "opts:anon"]);
    }

    #[test]
    fn test_args_only() {
        let calls = log();
        let l = calls.clone();
        let plan = func(move |args: Args| l.lock().unwrap().push(format!("args:{}", args.join(","))))
            .unwrap();
        assert_eq!(run_args(&plan, &["app", "a", "b"]), 0);
        assert_eq!(run_args(&plan, &["app"]), 0);
        assert_eq!(entries(&calls), vec!["args:a,b", "args:"]);
    }

    #[test]
    fn test_flags_after_positionals() {
        let calls = log();
        let l = calls.clone();
        let plan = func(move |opts: Opts, args: Args| {
            l.lock()
                .unwrap()
                .push(format!("{}:{}", opts.name, args.join(",")));
        })
        .unwrap();
        assert_eq!(run_args(&plan, &["app", "x", "--name", "bo"]), 0);
        assert_eq!(run_args(&plan, &["app", "x", "--name", "bo", "y"]), 0);
        assert_eq!(run_args(&plan, &["app", "x", "--", "--name", "bo"]), 0);
        assert_eq!(
            entries(&calls),
            vec!["bo:x", "bo:x,y", "anon:x,--name,bo"]
        );
    }

    #[test]
    fn test_options_field_clashing_with_args_rejected() {
        #[derive(clap::Args, Default)]
        struct Passthrough {
            #[arg(long)]
            args: Option<String>,
        }

        let err = func(|_: Passthrough, _: Args| {}).unwrap_err();
        assert!(matches!(err, climate::Error::InvalidShapeKind(_)));
    }

    #[test]
    fn test_context_and_options() {
        let calls = log();
        let l = calls.clone();
        let plan = func(move |ctx: Context, opts: Opts| {
            l.lock()
                .unwrap()
                .push(format!("{}:{}", ctx.is_cancelled(), opts.name));
        })
        .unwrap();
        assert_eq!(run_args(&plan, &["app", "--name", "bo"]), 0);
        assert_eq!(entries(&calls), vec!["false:bo"]);
    }

    #[test]
    fn test_context_and_args() {
        let calls = log();
        let l = calls.clone();
        let plan = func(move |_: Context, args: Args| {
            l.lock().unwrap().push(format!("args:{}", args.len()));
        })
        .unwrap();
        assert_eq!(run_args(&plan, &["app", "x", "y", "z"]), 0);
        assert_eq!(entries(&calls), vec!["args:3"]);
    }

    #[test]
    fn test_options_and_args() {
        let calls = log();
        let l = calls.clone();
        let plan = func(move |opts: Opts, args: Args| {
            l.lock()
                .unwrap()
                .push(format!("{}:{}", opts.name, args.join(",")));
        })
        .unwrap();
        assert_eq!(run_args(&plan, &["app", "--name", "cy", "one", "two"]), 0);
        assert_eq!(entries(&calls), vec!["cy:one,two"]);
    }

    #[test]
    fn test_all_roles_fallible() {
        let calls = log();
        let l = calls.clone();
        let plan = func(move |ctx: Context, opts: Opts, args: Args| -> anyhow::Result<()> {
            l.lock().unwrap().push(format!(
                "{}:{}:{}",
                ctx.path().join("/"),
                opts.name,
                args.join(",")
            ));
            Ok(())
        })
        .unwrap();
        assert_eq!(run_args(&plan, &["app", "--name", "di", "f1"]), 0);
        assert_eq!(entries(&calls), vec!["app:di:f1"]);
    }
}

// =============================================================================
// Exit codes
// =============================================================================

mod exit_code_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_ok_and_plain_error() {
        let ok = func(|_: Context, _: Opts, _: Args| -> anyhow::Result<()> { Ok(()) }).unwrap();
        assert_eq!(run_args(&ok, &["app"]), 0);

        let boom =
            func(|_: Context, _: Opts, _: Args| -> anyhow::Result<()> { Err(anyhow!("boom")) })
                .unwrap();
        assert_eq!(run_args(&boom, &["app"]), 1);
    }

    #[test]
    fn test_explicit_exit_code() {
        let plan = func(|| -> anyhow::Result<()> { Err(climate::exit(7)) }).unwrap();
        assert_eq!(run_args(&plan, &["app"]), 7);
    }

    #[test]
    fn test_custom_error_type() {
        #[derive(Debug, thiserror::Error)]
        #[error("not found")]
        struct NotFound;

        let plan = func(|| -> Result<(), NotFound> { Err(NotFound) }).unwrap();
        assert_eq!(run_args(&plan, &["app"]), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_subprocess_exit_code() {
        let plan = func(|| -> anyhow::Result<()> {
            let status = std::process::Command::new("sh")
                .args(["-c", "exit 3"])
                .status()?;
            climate::SubprocessError::check("sh", status)?;
            Ok(())
        })
        .unwrap();
        assert_eq!(run_args(&plan, &["app"]), 3);
    }

    #[test]
    fn test_parse_errors_use_clap_codes() {
        let plan = func(|_: Opts| {}).unwrap();
        assert_eq!(run_args(&plan, &["app", "--help"]), 0);
        assert_eq!(run_args(&plan, &["app", "--nope"]), 2);
    }
}

// =============================================================================
// Struct plans
// =============================================================================

mod struct_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    static ALPHA_BUILT: AtomicUsize = AtomicUsize::new(0);

    #[derive(clap::Args, Default)]
    struct Root {
        #[arg(long)]
        verbose: bool,
    }

    #[derive(clap::Args)]
    struct Alpha {
        #[arg(long = "alpha-tag")]
        tag: Option<String>,
    }

    impl Default for Alpha {
        fn default() -> Self {
            ALPHA_BUILT.fetch_add(1, Ordering::SeqCst);
            Self { tag: None }
        }
    }

    #[derive(clap::Args, Default)]
    struct Beta {
        #[arg(long)]
        tag: Option<String>,
    }

    fn tree(calls: &Log) -> climate::StructPlan {
        let a = calls.clone();
        let b = calls.clone();
        let alpha = structure::<Alpha>()
            .method("run", move || a.lock().unwrap().push("alpha".into()))
            .unwrap();
        let beta = structure::<Beta>()
            .method("run", move |beta: Receiver<Beta>, root: Receiver<Root>| {
                b.lock().unwrap().push(format!(
                    "beta:{}:{}",
                    beta.tag.as_deref().unwrap_or("-"),
                    root.verbose
                ));
            })
            .unwrap();
        structure::<Root>()
            .subcommand(alpha)
            .unwrap()
            .subcommand(beta)
            .unwrap()
    }

    #[test]
    fn test_only_selected_child_runs() {
        let calls = log();
        let plan = tree(&calls);
        let before = ALPHA_BUILT.load(Ordering::SeqCst);

        assert_eq!(run_args(&plan, &["app", "--verbose", "beta", "run", "--tag", "x"]), 0);

        assert_eq!(entries(&calls), vec!["beta:x:true"]);
        assert_eq!(ALPHA_BUILT.load(Ordering::SeqCst), before);
    }

    #[test]
    fn test_global_flag_after_subcommand() {
        let calls = log();
        let plan = tree(&calls);
        assert_eq!(run_args(&plan, &["app", "beta", "run", "--verbose"]), 0);
        assert_eq!(entries(&calls), vec!["beta:-:true"]);
    }

    #[test]
    fn test_bare_node_shows_help() {
        let calls = log();
        let plan = tree(&calls);
        assert_eq!(run_args(&plan, &["app"]), 0);
        assert_eq!(run_args(&plan, &["app", "beta"]), 0);
        assert!(entries(&calls).is_empty());
    }

    #[test]
    fn test_unknown_subcommand() {
        let calls = log();
        let plan = tree(&calls);
        assert_eq!(run_args(&plan, &["app", "gamma"]), 2);
        assert!(entries(&calls).is_empty());
    }

    #[test]
    fn test_child_error_propagates_unchanged() {
        let plan = structure::<Root>()
            .subcommand(
                structure::<Beta>()
                    .method("fail", || -> anyhow::Result<()> { Err(climate::exit(9)) })
                    .unwrap(),
            )
            .unwrap();
        assert_eq!(run_args(&plan, &["app", "beta", "fail"]), 9);
    }

    #[test]
    #[should_panic(expected = "is not provided")]
    fn test_unresolved_receiver_aborts() {
        let plan = structure::<Beta>()
            .method("run", |_: Receiver<Root>| {})
            .unwrap();
        run_args(&plan, &["app", "run"]);
    }
}

// =============================================================================
// Context and metadata
// =============================================================================

mod context_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_context_cancelled_after_run() {
        let seen: Arc<Mutex<Option<Context>>> = Arc::new(Mutex::new(None));
        let s = seen.clone();
        let plan = func(move |ctx: Context| {
            assert!(!ctx.is_cancelled());
            *s.lock().unwrap() = Some(ctx);
        })
        .unwrap();

        let parent = CancellationToken::new();
        let code = run(&parent, &plan, RunOptions::default().args(["app"]));
        assert_eq!(code, 0);

        let ctx = seen.lock().unwrap().take().unwrap();
        assert!(ctx.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[test]
    fn test_cancelled_on_error_too() {
        let seen: Arc<Mutex<Option<Context>>> = Arc::new(Mutex::new(None));
        let s = seen.clone();
        let plan = func(move |ctx: Context| -> anyhow::Result<()> {
            *s.lock().unwrap() = Some(ctx);
            Err(anyhow!("boom"))
        })
        .unwrap();
        assert_eq!(run_args(&plan, &["app"]), 1);
        assert!(seen.lock().unwrap().as_ref().unwrap().is_cancelled());
    }

    #[test]
    fn test_cancellation_does_not_change_exit_code() {
        let ok = func(|ctx: Context| ctx.cancel()).unwrap();
        assert_eq!(run_args(&ok, &["app"]), 0);

        let failing = func(|ctx: Context| -> anyhow::Result<()> {
            ctx.cancel();
            Err(anyhow!("boom"))
        })
        .unwrap();
        assert_eq!(run_args(&failing, &["app"]), 1);
    }

    #[test]
    fn test_parent_cancellation_is_visible() {
        let plan = func(|ctx: Context| -> anyhow::Result<()> {
            if ctx.is_cancelled() {
                Err(climate::exit(130))
            } else {
                Ok(())
            }
        })
        .unwrap();
        let parent = CancellationToken::new();
        parent.cancel();
        assert_eq!(run(&parent, &plan, RunOptions::default().args(["app"])), 130);
    }

    #[test]
    fn test_metadata_aliases_resolve() {
        let calls = log();
        let l = calls.clone();
        let plan = structure::<Opts>()
            .method("status", move || l.lock().unwrap().push("status".into()))
            .unwrap();
        let payload = br#"{"children": {"status": {"short": "Show status", "aliases": ["st"]}}}"#;
        let code = run(
            &CancellationToken::new(),
            &plan,
            RunOptions::default().metadata(&payload[..]).args(["app", "st"]),
        );
        assert_eq!(code, 0);
        assert_eq!(entries(&calls), vec!["status"]);
    }

    #[test]
    #[should_panic(expected = "malformed metadata")]
    fn test_malformed_metadata_is_fatal() {
        let plan = func(|| {}).unwrap();
        run(
            &CancellationToken::new(),
            &plan,
            RunOptions::default().metadata(&b"{\"short\":"[..]).args(["app"]),
        );
    }
}
