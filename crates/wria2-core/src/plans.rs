//! Pipelines for each kind of run.

use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use wria2_exec::{SequentialPipeline, SupervisedPipeline, TriggerRule, TriggerSet};

use crate::error::BuildError;
use crate::layout::{soy_build_dir, FullPaths, SoloPaths};
use crate::notify::{Notification, Notifier};
use crate::steps::{
    BuildState, ComboGate, ConfirmStep, EnsureDir, InstallPackages, RemovePath, RequireFile,
    RunEnv, ToolStep, WatchStep,
};

pub type BuildPipeline = SequentialPipeline<BuildState, BuildError>;
pub type WatchPipeline = SupervisedPipeline<BuildError>;

/// Build a single component, then optionally the seed.
pub fn solo_build(env: &Arc<RunEnv>, paths: &SoloPaths) -> BuildPipeline {
    let s = &env.settings;
    SequentialPipeline::new("solo_build")
        .then(
            ToolStep::new(
                env,
                env.tool("compass_clean", &format!("{} clean", s.compass))
                    .in_dir(&paths.component),
            )
            .when(env.request.clean),
        )
        .then(RemovePath::new("remove_md5sum", &paths.md5sum).best_effort())
        .then(ToolStep::new(
            env,
            env.tool("shifter", &format!("{} --lint-stderr", s.shifter))
                .in_dir(&paths.component),
        ))
        .then(
            ConfirmStep::new(env, "confirm_seed", "Do you also want to rebuild wf2 seed?", false)
                .announce(Notification::success("Build was successful").with_sound("Glass")),
        )
        .then(ToolStep::new(
            env,
            env.tool("shifter_seed", &format!("{} --lint false --csslint false", s.shifter))
                .in_dir(&paths.seed),
        ))
}

/// Watch a single component with shifter and compass side by side.
pub fn solo_watch(env: &Arc<RunEnv>, paths: &SoloPaths) -> WatchPipeline {
    let s = &env.settings;
    SupervisedPipeline::new("solo_watch")
        .with(
            WatchStep::new(
                env,
                env.tool("shifter_watch", &format!("{} --watch", s.shifter))
                    .in_dir(&paths.component),
            )
            .with_triggers(shifter_triggers(env.notifier.clone())),
        )
        .with(WatchStep::new(
            env,
            env.tool("compass_watch", &format!("{} watch", s.compass))
                .in_dir(&paths.component),
        ))
}

/// Build the whole tree.
pub fn full_build(env: &Arc<RunEnv>, paths: &FullPaths) -> BuildPipeline {
    let s = &env.settings;
    SequentialPipeline::new("full_build")
        .then(RequireFile::new("check_yui", "key YUI3 source files", &paths.yui_js))
        .then(RequireFile::new(
            "check_shifter_json",
            "a .shifter.json configuration file",
            &paths.shifter_json,
        ))
        .then(ComboGate::new(env, &paths.shifter_json))
        .then(InstallPackages::new(env, &paths.build_root))
        .then(RemovePath::new("remove_output", &paths.output))
        .then(EnsureDir::new("base_css_templates", &paths.base_css_templates))
        .then(ToolStep::new(
            env,
            env.tool(
                "prebuild_loader",
                &format!("{} wf2_prebuild_loader_dependencies.js", s.node),
            )
            .in_dir(&paths.build_lib),
        ))
        .then(ToolStep::new(
            env,
            env.tool(
                "shifter_walk",
                &format!("{} --lint false --csslint false --walk", s.shifter),
            )
            .in_dir(&paths.src_root),
        ))
        .then(
            ToolStep::new(
                env,
                env.tool("shifter_seed", &format!("{} --lint false --csslint false", s.shifter))
                    .in_dir(&paths.seed),
            )
            .only_if_exists(&paths.seed),
        )
}

/// Watch the whole tree.
pub fn full_watch(env: &Arc<RunEnv>, paths: &FullPaths) -> WatchPipeline {
    SupervisedPipeline::new("full_watch").with(WatchStep::new(
        env,
        env.tool("shifter_watch", &format!("{} --watch", env.settings.shifter))
            .in_dir(&paths.src_root),
    ))
}

/// Compile every Soy template of the checkout at `root`.
pub fn soy(env: &Arc<RunEnv>, root: &Path) -> BuildPipeline {
    SequentialPipeline::new("soy").then(ToolStep::new(
        env,
        env.tool("soy", &format!("{} wf2_templates.js", env.settings.node))
            .in_dir(soy_build_dir(root))
            .verbose(true)
            .status(false),
    ))
}

/// Notify on shifter's build results while watching.
pub fn shifter_triggers(notifier: Arc<dyn Notifier>) -> TriggerSet {
    let on_success = notifier.clone();
    let on_failure = notifier;
    TriggerSet::new(vec![
        TriggerRule::new(
            Regex::new("build exited with 0").expect("static pattern"),
            move |_| on_success.notify(&Notification::success("Build looks good...")),
        ),
        TriggerRule::new(
            Regex::new("build failed").expect("static pattern"),
            move |_| {
                on_failure.notify(&Notification::failure("Ooops build failed...").with_sound("Sosumi"))
            },
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{RecordingNotifier, RecordingRunner, ScriptedPrompter};
    use crate::request::{BuildRequest, BuildType};
    use crate::settings::Settings;
    use wria2_exec::{ExecContext, Foreground};

    fn env(clean: bool) -> Arc<RunEnv> {
        let request = BuildRequest {
            clean,
            ..BuildRequest::new(BuildType::Build)
        }
        .in_dir("/repo/wf2/src/comp")
        .normalize(Foreground::Available)
        .unwrap();
        Arc::new(RunEnv {
            request,
            settings: Settings::default(),
            exec: ExecContext::default(),
            runner: Arc::new(RecordingRunner::new()),
            prompter: Arc::new(ScriptedPrompter::default()),
            notifier: Arc::new(RecordingNotifier::default()),
        })
    }

    #[test]
    fn test_solo_build_steps_in_order() {
        let env = env(false);
        let pipeline = solo_build(&env, &SoloPaths::new(Path::new("/repo/wf2/src/comp")));
        assert_eq!(
            pipeline.step_names(),
            vec!["compass_clean", "remove_md5sum", "shifter", "confirm_seed", "shifter_seed"]
        );
    }

    #[test]
    fn test_full_build_steps_in_order() {
        let env = env(false);
        let pipeline = full_build(&env, &FullPaths::new(Path::new("/repo/wf2/src")));
        assert_eq!(
            pipeline.step_names(),
            vec![
                "check_yui",
                "check_shifter_json",
                "combo_gate",
                "npm_install",
                "remove_output",
                "base_css_templates",
                "prebuild_loader",
                "shifter_walk",
                "shifter_seed",
            ]
        );
    }

    #[test]
    fn test_watch_pipelines_member_counts() {
        let env = env(false);
        assert_eq!(
            solo_watch(&env, &SoloPaths::new(Path::new("/repo/wf2/src/comp"))).len(),
            2
        );
        assert_eq!(full_watch(&env, &FullPaths::new(Path::new("/repo/wf2/src"))).len(), 1);
    }

    #[test]
    fn test_shifter_triggers_notify() {
        let notifier = Arc::new(RecordingNotifier::default());
        let mut triggers = shifter_triggers(notifier.clone());

        triggers.scan("[info] build exited with 0");
        triggers.scan("[err] build failed");
        triggers.scan("[info] build exited with 0");

        let sent = notifier.sent();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0].message, "Build looks good...");
        assert!(sent[1].failure);
        assert_eq!(sent[1].sound.as_deref(), Some("Sosumi"));
    }
}
