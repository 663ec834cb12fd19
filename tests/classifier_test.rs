use issue_labeler::{load_issues, ClassifierBuilder, GithubIssue, IssueClassifier};
use std::sync::Arc;
use std::thread;

const SAMPLE_DATA: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/corefx-issues-sample.tsv");

fn setup_test_classifier() -> IssueClassifier {
    let issues = load_issues(SAMPLE_DATA).expect("Failed to load sample data");
    ClassifierBuilder::new()
        .fit(&issues)
        .expect("Failed to train classifier")
}

#[test]
fn test_prediction_is_a_known_label() {
    let classifier = setup_test_classifier();
    let issue = GithubIssue::new("Crash on startup", "App throws NullReferenceException on launch");

    let prediction = classifier.predict(&issue).unwrap();
    assert!(!prediction.area.is_empty());
    assert!(classifier.labels().contains(&prediction.area));
}

#[test]
fn test_scores_form_a_distribution() {
    let classifier = setup_test_classifier();
    let prediction = classifier
        .predict(&GithubIssue::new("List.Sort is slow", "Sorting a large List takes too long"))
        .unwrap();

    assert_eq!(prediction.score.len(), classifier.labels().len());
    assert!(prediction.score.iter().all(|&s| (0.0..=1.0).contains(&s)));
    let total: f32 = prediction.score.iter().sum();
    assert!((total - 1.0).abs() < 1e-4, "scores sum to {}", total);

    let best = classifier
        .labels()
        .iter()
        .position(|label| *label == prediction.area)
        .unwrap();
    assert_eq!(prediction.confidence(), prediction.score[best]);
}

#[test]
fn test_same_issue_gets_same_label() {
    let classifier = setup_test_classifier();
    let issue = GithubIssue::new("Socket connect hangs", "TCP connection to the server never completes");

    let first = classifier.predict(&issue).unwrap();
    let second = classifier.predict(&issue).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_training_is_reproducible() {
    let issues = load_issues(SAMPLE_DATA).unwrap();
    let builder = ClassifierBuilder::new().with_seed(11);
    let a = builder.fit(&issues).unwrap();
    let b = builder.fit(&issues).unwrap();

    let issue = GithubIssue::new("GC pause", "Garbage collection pauses are long");
    assert_eq!(a.predict(&issue).unwrap(), b.predict(&issue).unwrap());
}

#[test]
fn test_held_out_examples() {
    let classifier = setup_test_classifier();

    let net = classifier
        .predict(&GithubIssue::new(
            "HttpClient proxy timeout",
            "Requests through the proxy hang until HttpClient times out",
        ))
        .unwrap();
    assert_eq!(net.area, "area-System.Net");

    let collections = classifier
        .predict(&GithubIssue::new(
            "Dictionary TrimExcess",
            "The Dictionary keeps its bucket capacity after Remove",
        ))
        .unwrap();
    assert_eq!(collections.area, "area-System.Collections");
}

#[test]
fn test_empty_input_still_predicts() {
    let classifier = setup_test_classifier();
    let prediction = classifier.predict(&GithubIssue::new("", "")).unwrap();
    assert!(classifier.labels().contains(&prediction.area));
}

#[test]
fn test_class_info() {
    let classifier = setup_test_classifier();
    let info = classifier.info();
    assert_eq!(info.num_classes, 4);
    assert_eq!(info.class_labels[0], "area-System.Net");
    assert!(info.title_ngrams > 0);
    assert!(info.description_ngrams > 0);
    assert!(info.training.epochs > 0);
    assert!(info.training.primal_objective >= info.training.dual_objective - 1e-6);
}

#[test]
fn test_thread_safety() {
    let classifier = Arc::new(setup_test_classifier());
    let mut handles = vec![];

    for i in 0..3 {
        let classifier = Arc::clone(&classifier);
        let handle = thread::spawn(move || {
            let issue = GithubIssue::new(format!("FileStream issue {}", i), "Cannot read file");
            let result = classifier.predict(&issue);
            assert!(result.is_ok());
        });
        handles.push(handle);
    }

    for handle in handles {
        handle.join().unwrap();
    }
}
