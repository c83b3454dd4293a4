//! Runs generated modules through a real interpreter. Skipped when python3 is missing.

mod common;

use common::{python_available, ScriptedGenerator};
use lazydsgen::{
    printer::CodePrinter, ArtifactExecutor, Error, GenerationSettings, InputData, InvokeOptions,
    PythonExecutor, Session,
};
use serde_json::json;
use std::time::Duration;

macro_rules! require_python {
    () => {
        if !python_available() {
            println!("python3 not found, skipping");
            return;
        }
    };
}

fn session_in(dir: &tempfile::TempDir, generator: ScriptedGenerator) -> Session {
    let executor = PythonExecutor::new(dir.path().join("generated.py")).unwrap();
    Session::new(
        InputData::new(json!([{"city": "Lyon", "pop": 522000}, {"city": "Nice", "pop": 342000}])),
        "a list of cities with their population",
        GenerationSettings { n_tries: 3, ..Default::default() },
        generator,
        executor,
    )
    .with_printer(CodePrinter::plain())
}

const LARGEST: &str = "```python
def fun_generated(data):
    print('looking for the largest city')
    return max(data, key=lambda row: row['pop'])['city']
```";

#[tokio::test]
async fn generated_function_result_round_trips() {
    require_python!();
    let dir = tempfile::tempdir().unwrap();
    let s = session_in(&dir, ScriptedGenerator::always(LARGEST));

    let env = s.invoke("largest city?", InvokeOptions::default()).await.unwrap();
    assert_eq!(env.result, json!("Lyon"));
    assert!(!dir.path().join("generated.py").exists());
    assert!(!s.executor().has_stale_state());
}

#[tokio::test]
async fn syntax_errors_surface_as_artifact_errors() {
    require_python!();
    let dir = tempfile::tempdir().unwrap();
    let s = session_in(&dir, ScriptedGenerator::always("def fun_generated(data) return 1"));

    let err = s.invoke("q", InvokeOptions::default()).await.unwrap_err();
    assert!(matches!(&err, Error::Artifact(m) if m.contains("SyntaxError")), "{err}");
    assert!(!dir.path().join("generated.py").exists());
}

#[tokio::test]
async fn missing_entry_point_is_an_artifact_error() {
    require_python!();
    let dir = tempfile::tempdir().unwrap();
    let s = session_in(&dir, ScriptedGenerator::always("def solve(data):\n    return 1\n"));

    let err = s.invoke("q", InvokeOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::Artifact(_)));
}

#[tokio::test]
async fn raising_entry_point_is_an_execution_error() {
    require_python!();
    let dir = tempfile::tempdir().unwrap();
    let s = session_in(
        &dir,
        ScriptedGenerator::always("def fun_generated(data):\n    return data[0]['population']\n"),
    );

    let err = s.invoke("q", InvokeOptions::default()).await.unwrap_err();
    assert!(matches!(&err, Error::Execution(m) if m.contains("KeyError")), "{err}");
    assert!(!dir.path().join("generated.py").exists());
}

#[tokio::test]
async fn retries_load_the_new_artifact_not_a_cached_one() {
    require_python!();
    let dir = tempfile::tempdir().unwrap();
    let generator = ScriptedGenerator::new(vec![
        Ok("def fun_generated(data):\n    raise ValueError('first')\n".into()),
        Ok("def fun_generated(data):\n    return len(data)\n".into()),
    ]);
    let s = session_in(&dir, generator.clone());

    let env = s.invoke_with_tries("how many cities?", InvokeOptions::default()).await;
    assert_eq!(env.result, json!(2));
    assert_eq!(generator.calls(), 2);
    assert!(!dir.path().join("__pycache__").exists());
    assert!(!s.executor().has_stale_state());
}

#[tokio::test]
async fn unserializable_results_fall_back_to_str() {
    require_python!();
    let dir = tempfile::tempdir().unwrap();
    let executor = PythonExecutor::new(dir.path().join("generated.py")).unwrap();

    let value = executor
        .execute(
            "def fun_generated(data):\n    return complex(1, 2)\n",
            "fun_generated",
            &InputData::new(json!(null)),
        )
        .await
        .unwrap();
    assert_eq!(value, json!("(1+2j)"));
}

#[tokio::test]
async fn raw_fd_writes_do_not_corrupt_the_outcome() {
    require_python!();
    let dir = tempfile::tempdir().unwrap();
    let executor = PythonExecutor::new(dir.path().join("generated.py")).unwrap();

    let value = executor
        .execute(
            "import os, subprocess, sys\n\ndef fun_generated(data):\n    os.write(1, b'progress')\n    subprocess.run([sys.executable, '-c', 'print(1, end=\"\")'])\n    return 5\n",
            "fun_generated",
            &InputData::new(json!(null)),
        )
        .await
        .unwrap();
    assert_eq!(value, json!(5));
}

#[tokio::test]
async fn timed_out_run_releases_the_slot() {
    require_python!();
    let dir = tempfile::tempdir().unwrap();
    let executor = PythonExecutor::new(dir.path().join("generated.py"))
        .unwrap()
        .with_timeout(Duration::from_secs(1));

    let err = executor
        .execute(
            "def fun_generated(data):\n    while True:\n        pass\n",
            "fun_generated",
            &InputData::new(json!([])),
        )
        .await
        .unwrap_err();
    assert!(matches!(&err, Error::Execution(m) if m.contains("did not return")), "{err}");
    assert!(!dir.path().join("generated.py").exists());
    assert!(!executor.has_stale_state());
}
