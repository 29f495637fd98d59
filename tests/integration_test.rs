use anyhow::Result;
use futures::future::BoxFuture;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tiku_ingest::models::Batch;
use tiku_ingest::orchestrator::{CancelToken, PipelineOptions, StreamPipeline};
use tiku_ingest::services::BatchSink;
use tiku_ingest::workflow::BlockFlow;
use tiku_ingest::{Config, ParsedQuestion};

/// 本地包装类型：孤儿规则不允许直接为 `Arc<本地类型>` 实现外部 trait
struct Shared<T>(Arc<T>);

/// 收集所有批次的测试落库端
#[derive(Default)]
struct CollectingSink {
    batches: Mutex<Vec<Batch>>,
}

impl CollectingSink {
    fn questions(&self) -> Vec<ParsedQuestion> {
        let mut batches = self.batches.lock().unwrap().clone();
        batches.sort_by_key(|b| b.ordinal);
        batches.into_iter().flat_map(|b| b.questions).collect()
    }
}

impl BatchSink for Shared<CollectingSink> {
    fn dispatch(&self, batch: Batch) -> BoxFuture<'static, Result<()>> {
        let sink = Arc::clone(&self.0);
        Box::pin(async move {
            sink.batches.lock().unwrap().push(batch);
            Ok(())
        })
    }
}

/// 统计在途派发数量的测试落库端
#[derive(Default)]
struct GaugeSink {
    current: AtomicUsize,
    max_seen: AtomicUsize,
    ordinals: Mutex<Vec<u64>>,
    batch_count: AtomicUsize,
}

impl BatchSink for Shared<GaugeSink> {
    fn dispatch(&self, batch: Batch) -> BoxFuture<'static, Result<()>> {
        let sink = Arc::clone(&self.0);
        Box::pin(async move {
            let in_flight = sink.current.fetch_add(1, Ordering::SeqCst) + 1;
            sink.max_seen.fetch_max(in_flight, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(2)).await;

            let mut ordinals = sink.ordinals.lock().unwrap();
            ordinals.extend(batch.questions.iter().map(|q| q.ordinal));
            drop(ordinals);

            sink.batch_count.fetch_add(1, Ordering::SeqCst);
            sink.current.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

/// 指定批次派发失败的测试落库端
struct FailingSink {
    fail_batch: u64,
    dispatched: AtomicUsize,
}

impl BatchSink for Shared<FailingSink> {
    fn dispatch(&self, batch: Batch) -> BoxFuture<'static, Result<()>> {
        let sink = Arc::clone(&self.0);
        Box::pin(async move {
            sink.dispatched.fetch_add(1, Ordering::SeqCst);
            if batch.ordinal == sink.fail_batch {
                anyhow::bail!("存储端拒绝该批次");
            }
            Ok(())
        })
    }
}

/// 第一次派发后立即发出取消信号的测试落库端
struct CancellingSink {
    cancel: CancelToken,
    dispatched: AtomicUsize,
}

impl BatchSink for Shared<CancellingSink> {
    fn dispatch(&self, batch: Batch) -> BoxFuture<'static, Result<()>> {
        let sink = Arc::clone(&self.0);
        Box::pin(async move {
            let _ = batch;
            sink.dispatched.fetch_add(1, Ordering::SeqCst);
            sink.cancel.cancel();
            Ok(())
        })
    }
}

fn single_choice_block(n: usize) -> String {
    format!(
        "\\begin{{question}}\n% 来源: 单元测试卷\n% [2P1H2-1]\n% T{n}\n\
         第 {n} 题：2+2=？\n\\choice{{\\ans 4}}{{2}}{{3}}{{5}}\n\
         \\solution{{显然 {{2+2=4}}。}}\n\\end{{question}}\n",
    )
}

fn pipeline(options: PipelineOptions, sink: impl BatchSink + 'static) -> StreamPipeline {
    StreamPipeline::new(options, BlockFlow::new(&Config::default()), Arc::new(sink))
}

fn chunked_reader(input: &str, chunk: usize) -> tokio_test::io::Mock {
    let mut builder = tokio_test::io::Builder::new();
    for part in input.as_bytes().chunks(chunk) {
        builder.read(part);
    }
    builder.build()
}

#[tokio::test]
async fn chunk_boundaries_do_not_change_parse_results() {
    let input: String = (1..=20).map(single_choice_block).collect();

    let mut results: Vec<Vec<ParsedQuestion>> = Vec::new();
    // 一次性读入、正常分块、以及切碎到会割裂多字节字符和结构标记的分块
    for chunk in [input.len(), 64, 7] {
        let sink = Arc::new(CollectingSink::default());
        let options = PipelineOptions {
            chunk_size: 16,
            max_batch_size: 6,
            max_concurrent_batches: 2,
        };
        let report = pipeline(options, Shared(Arc::clone(&sink)))
            .run(chunked_reader(&input, chunk))
            .await
            .expect("流水线应该运行成功");
        assert_eq!(report.total_blocks, 20);
        assert_eq!(report.parsed, 20);
        assert!(report.is_clean(), "不应出现任何错误: {report:?}");
        results.push(sink.questions());
    }

    assert_eq!(results[0], results[1], "分块方式不应影响解析结果");
    assert_eq!(results[0], results[2], "分块方式不应影响解析结果");
    assert_eq!(results[0].len(), 20);
    assert_eq!(results[0][0].content, "第 1 题：2+2=？");
}

#[tokio::test]
async fn ten_thousand_blocks_dispatch_fifty_bounded_batches() {
    let input: String = (1..=10_000).map(single_choice_block).collect();

    let sink = Arc::new(GaugeSink::default());
    let options = PipelineOptions {
        chunk_size: 64 * 1024,
        max_batch_size: 200,
        max_concurrent_batches: 5,
    };
    let report = pipeline(options, Shared(Arc::clone(&sink)))
        .run(Cursor::new(input.into_bytes()))
        .await
        .expect("流水线应该运行成功");

    assert_eq!(report.total_blocks, 10_000);
    assert_eq!(report.parsed, 10_000);
    assert_eq!(report.batches_dispatched, 50);
    assert_eq!(sink.batch_count.load(Ordering::SeqCst), 50);
    assert!(
        sink.max_seen.load(Ordering::SeqCst) <= 5,
        "在途派发数不应超过上限，实际 {}",
        sink.max_seen.load(Ordering::SeqCst)
    );

    // 所有题目序号恰好各出现一次
    let mut ordinals = sink.ordinals.lock().unwrap().clone();
    ordinals.sort_unstable();
    assert_eq!(ordinals.len(), 10_000);
    assert!(ordinals.iter().enumerate().all(|(i, &o)| o == i as u64 + 1));
}

#[tokio::test]
async fn block_errors_are_isolated() {
    let bad = "\\begin{question}\n坏题\\choice{\\ans A}{\\ans B}\n\\end{question}\n";
    let input = format!(
        "{}{}{}",
        single_choice_block(1),
        bad,
        single_choice_block(3)
    );

    let sink = Arc::new(CollectingSink::default());
    let report = pipeline(PipelineOptions::default(), Shared(Arc::clone(&sink)))
        .run(Cursor::new(input.into_bytes()))
        .await
        .unwrap();

    assert_eq!(report.total_blocks, 3);
    assert_eq!(report.parsed, 2);
    assert_eq!(report.block_errors.len(), 1);
    assert_eq!(report.block_errors[0].ordinal, 2);
    assert!(!report.block_errors[0].reason.is_empty());

    let ordinals: Vec<u64> = sink.questions().iter().map(|q| q.ordinal).collect();
    assert_eq!(ordinals, vec![1, 3]);
}

#[tokio::test]
async fn malformed_tail_is_reported_not_dropped() {
    let input = format!(
        "{}\\begin{{question}}\n这个题块没有结束标记",
        single_choice_block(1)
    );

    let sink = Arc::new(CollectingSink::default());
    let report = pipeline(PipelineOptions::default(), Shared(Arc::clone(&sink)))
        .run(Cursor::new(input.into_bytes()))
        .await
        .unwrap();

    assert_eq!(report.parsed, 1, "坏尾不影响之前的题块");
    assert!(report.tail_error.is_some());
    assert!(!report.is_clean());
}

#[tokio::test]
async fn dispatch_failure_does_not_halt_pipeline() {
    let input: String = (1..=3).map(single_choice_block).collect();

    let sink = Arc::new(FailingSink {
        fail_batch: 2,
        dispatched: AtomicUsize::new(0),
    });
    let options = PipelineOptions {
        chunk_size: 8192,
        max_batch_size: 1,
        max_concurrent_batches: 2,
    };
    let report = pipeline(options, Shared(Arc::clone(&sink)))
        .run(Cursor::new(input.into_bytes()))
        .await
        .unwrap();

    assert_eq!(report.batches_dispatched, 3);
    assert_eq!(sink.dispatched.load(Ordering::SeqCst), 3);
    assert_eq!(report.dispatch_errors.len(), 1);
    assert_eq!(report.dispatch_errors[0].batch_ordinal, 2);
    assert!(report.dispatch_errors[0].reason.contains("拒绝"));
}

#[tokio::test]
async fn cancellation_stops_new_dispatches() {
    let input: String = (1..=10).map(single_choice_block).collect();

    let cancel = CancelToken::new();
    let sink = Arc::new(CancellingSink {
        cancel: cancel.clone(),
        dispatched: AtomicUsize::new(0),
    });
    // 在途上限 1：第二个批次必须等第一个结束，届时取消信号已经发出
    let options = PipelineOptions {
        chunk_size: 8192,
        max_batch_size: 1,
        max_concurrent_batches: 1,
    };
    let report = pipeline(options, Shared(Arc::clone(&sink)))
        .with_cancel(cancel)
        .run(Cursor::new(input.into_bytes()))
        .await
        .unwrap();

    assert!(report.cancelled, "报告应标记为未完成");
    assert_eq!(report.batches_dispatched, 1);
    assert_eq!(sink.dispatched.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn pre_cancelled_pipeline_reads_nothing() {
    let cancel = CancelToken::new();
    cancel.cancel();

    let sink = Arc::new(CollectingSink::default());
    let input = single_choice_block(1);
    let report = pipeline(PipelineOptions::default(), Shared(Arc::clone(&sink)))
        .with_cancel(cancel)
        .run(Cursor::new(input.into_bytes()))
        .await
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.total_blocks, 0);
    assert_eq!(report.batches_dispatched, 0);
}

#[tokio::test]
async fn mixed_kinds_end_to_end() {
    let input = "\\begin{question}\n% [0P1VH1]\n判断对错\n\\choiceTF{\\ans 对}{错}{\\ans 对}{错}\n\\end{question}\n\
                 \\begin{question}\n填空：1+1=\n\\shortans{2}\n\\end{question}\n\
                 \\begin{question}\n论述流式解析的意义。\n\\solution{要点{一}与要点{二}。}\n\\end{question}\n"
        .to_string();

    let sink = Arc::new(CollectingSink::default());
    let report = pipeline(PipelineOptions::default(), Shared(Arc::clone(&sink)))
        .run(Cursor::new(input.into_bytes()))
        .await
        .unwrap();

    assert!(report.is_clean(), "不应出现任何错误: {report:?}");
    let questions = sink.questions();
    assert_eq!(questions.len(), 3);

    use tiku_ingest::{CorrectAnswer, QuestionKind};
    assert_eq!(questions[0].kind, QuestionKind::MultiTrueFalse);
    assert_eq!(
        questions[0].correct_answer,
        CorrectAnswer::TrueFalse(vec![1, 3])
    );
    assert!(questions[0].taxonomy.is_some());

    assert_eq!(questions[1].kind, QuestionKind::ShortAnswer);
    assert_eq!(
        questions[1].correct_answer,
        CorrectAnswer::Short("2".to_string())
    );

    assert_eq!(questions[2].kind, QuestionKind::Essay);
    assert_eq!(questions[2].correct_answer, CorrectAnswer::Essay);
    assert_eq!(
        questions[2].solution.as_deref(),
        Some("要点{一}与要点{二}。")
    );
}
