use std::collections::HashMap;
use std::path::PathBuf;

use shipyard_core::execution::TaskRole;
use shipyard_core::{PipelineManager, PipelineManagerConfig};

fn demo_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos/cdc-agents")
        .canonicalize()
        .expect("demos/cdc-agents directory should exist for tests")
}

fn demo_manager(enabled: &str) -> PipelineManager {
    PipelineManager::new(PipelineManagerConfig {
        project_dir: demo_dir(),
        config_path: None,
        properties: HashMap::from([
            ("enable-docker".to_string(), enabled.to_string()),
            ("build-cdc-agents".to_string(), enabled.to_string()),
        ]),
    })
    .expect("demo pipeline should load")
}

#[test]
fn demo_pipeline_plans_the_docker_build() {
    let plan = demo_manager("true").plan("buildDocker").unwrap();

    let order: Vec<&str> = plan.order.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(
        order,
        vec![
            "copyLibs",
            "cdcAgentsDockerImage",
            "pushImages",
            "bootJar",
            "buildDocker",
            "cleanJars"
        ]
    );
    assert_eq!(plan.order.last().map(|(_, role)| *role), Some(TaskRole::Finalizer));
    assert!(plan.active);
}

#[test]
fn demo_pipeline_jar_is_finalized_by_the_docker_build() {
    let manager = demo_manager("true");
    let target = manager.resolve_target(None).unwrap();
    assert_eq!(target, "jar");

    let plan = manager.plan(&target).unwrap();
    let order: Vec<(&str, TaskRole)> =
        plan.order.iter().map(|(id, role)| (id.as_str(), *role)).collect();
    assert_eq!(
        order,
        vec![
            ("copyLibs", TaskRole::Target),
            ("cdcAgentsDockerImage", TaskRole::Finalizer),
            ("pushImages", TaskRole::Finalizer),
            ("jar", TaskRole::Target),
            ("bootJar", TaskRole::Finalizer),
            ("buildDocker", TaskRole::Finalizer),
            ("cleanJars", TaskRole::Finalizer),
        ]
    );
}

#[test]
fn demo_pipeline_graph_has_no_cycles() {
    let graph = demo_manager("true").graph().unwrap();

    assert!(graph.cycles.is_empty());
    let push = graph.tasks.iter().find(|t| t.id == "pushImages").unwrap();
    assert_eq!(push.kind, "external");
    assert_eq!(push.depends_on, vec!["copyLibs".to_string()]);
    assert_eq!(push.do_last, vec!["./after-build.sh".to_string()]);
    let jar = graph.tasks.iter().find(|t| t.id == "jar").unwrap();
    assert_eq!(jar.finalized_by, vec!["buildDocker".to_string()]);
}

#[test]
fn demo_pipeline_is_inert_without_flags() {
    let report = demo_manager("false").run("buildDocker").unwrap();

    assert!(report.success());
    assert!(!report.active);
    assert!(report.tasks.is_empty());
}
