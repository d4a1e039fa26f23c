//! End-to-end pipeline scenarios over mock services.

use std::sync::Arc;

use audit::testing::{
    MemoryAuditStore, MockFetcher, MockOcr, MockReasoner, MockTranscriber, StaticRules,
};
use audit::{
    AuditError, AuditInput, AuditOptions, AuditStore, Pipeline, PipelineConfig, ReasonerError,
    Services, Severity, Status,
};
use tokio_util::sync::CancellationToken;

fn services(reasoner: MockReasoner, fetcher: MockFetcher, store: MemoryAuditStore) -> Services {
    Services {
        reasoner: Arc::new(reasoner),
        transcriber: Arc::new(MockTranscriber::new("")),
        ocr: Arc::new(MockOcr::new("")),
        rules: Arc::new(StaticRules::healthcare()),
        store: Arc::new(store),
        fetcher: Arc::new(fetcher),
    }
}

fn pipeline(reasoner: MockReasoner, fetcher: MockFetcher, store: MemoryAuditStore) -> Pipeline {
    Pipeline::new(
        services(reasoner, fetcher, store),
        PipelineConfig::default(),
    )
}

// ---------------------------------------------------------------------------
// S1: English text with a cure claim
// ---------------------------------------------------------------------------

#[tokio::test]
async fn s1_english_text_with_cure_claim() {
    let claim = "This medicine cures all diseases in 7 days!";
    let response = format!(
        r#"{{"score": 85, "status": "Non-Compliant",
            "summary": "Prohibited cure claim detected.",
            "financialPenalty": {{"riskLevel": "High", "description": "DMR Act penalties apply."}},
            "ethicalMarketing": {{"score": 20, "assessment": "Misleading."}},
            "violations": [{{
                "severity": "CRITICAL",
                "regulation": "Drugs and Magic Remedies Act, 1954",
                "violation_title": "Claim of curing all diseases",
                "evidence": "{claim}",
                "translation": "{claim}",
                "guidance": ["Remove the universal cure claim",
                             "Only make claims supported by clinical evidence"],
                "fix": ["This medicine supports your wellness routine.",
                        "This medicine may help manage symptoms; consult your doctor."],
                "risk_score": 95
            }}]}}"#
    );

    let reasoner = MockReasoner::new().with_response(response);
    let pipeline = pipeline(reasoner, MockFetcher::new(), MemoryAuditStore::new());

    let report = pipeline
        .audit(
            AuditInput::Text { body: claim.to_string() },
            AuditOptions::new("user-1", "healthcare"),
        )
        .await
        .unwrap();

    assert!(!report.violations.is_empty());
    let violation = &report.violations[0];
    assert_eq!(violation.evidence, claim);
    assert!(matches!(violation.severity, Severity::Critical | Severity::High));
    assert!(violation.guidance.len() >= 2);
    assert_eq!(violation.fix.len(), 2);
    assert!(violation.fix.iter().all(|f| !f.contains("cures")));
    assert_eq!(report.status, Status::NonCompliant);
    assert!(report.score >= 50);
}

// ---------------------------------------------------------------------------
// S2: Hindi text; translation populated, output in Devanagari
// ---------------------------------------------------------------------------

#[tokio::test]
async fn s2_hindi_text_keeps_devanagari_output() {
    let body = "यह आयुर्वेदिक दवा हर बीमारी का 100% इलाज है और सात दिनों में पूरा असर दिखाती है। अभी खरीदें और पुराने से पुराने रोग से छुटकारा पाएं।";
    let translation = "This ayurvedic medicine is a 100% cure for every disease and shows full effect in seven days. Buy now and get rid of even the oldest illness.";
    let report_json = r#"{"score": 80, "status": "Non-Compliant",
        "summary": "सौ प्रतिशत इलाज का दावा नियमों का उल्लंघन है।",
        "violations": [{
            "severity": "HIGH",
            "regulation": "Drugs and Magic Remedies Act, 1954",
            "violation_title": "हर बीमारी के इलाज का दावा",
            "evidence": "हर बीमारी का 100% इलाज",
            "translation": "a 100% cure for every disease",
            "guidance": ["इलाज के दावे को हटाएं", "केवल प्रमाणित लाभ बताएं"],
            "fix": ["यह दवा आपकी सेहत का सहारा बन सकती है।", "यह दवा आराम में मदद कर सकती है, चिकित्सक से सलाह लें।"],
            "risk_score": 85
        }]}"#;

    let reasoner = MockReasoner::new()
        .with_response(translation)
        .with_response(report_json);
    let pipeline = pipeline(reasoner.clone(), MockFetcher::new(), MemoryAuditStore::new());

    let report = pipeline
        .audit(
            AuditInput::Text { body: body.to_string() },
            AuditOptions::new("user-2", "healthcare"),
        )
        .await
        .unwrap();

    // Translation ran first (plain text), the audit second (JSON).
    let calls = reasoner.calls();
    assert_eq!(calls.len(), 2);
    assert!(!calls[0].json_output);
    assert!(calls[1].json_output);
    // The reasoner saw the English rendering, not the raw Hindi.
    assert!(calls[1].user.contains("ayurvedic medicine"));

    assert_eq!(report.transcription, translation);
    let violation = &report.violations[0];
    let devanagari = |s: &str| s.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c));
    assert!(devanagari(&violation.violation_title));
    assert!(violation.guidance.iter().all(|g| devanagari(g)));
    assert!(violation.fix.iter().all(|f| devanagari(f)));
    assert!(violation.regulation.is_ascii());
}

// ---------------------------------------------------------------------------
// S3: blocked web page; metadata-only degradation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn s3_blocked_page_degrades_to_metadata() {
    let href = "https://blocked.example/landing";
    let block_page = "<html><head><title>MiracleTonic Official Store</title>\
        <meta name=\"description\" content=\"Herbal tonic promising rapid relief within one week\">\
        </head><body>Access denied</body></html>";

    let fetcher = MockFetcher::new()
        .failing_with_status("https://r.jina.ai/https://blocked.example/landing", 403)
        .failing_with_body(href, 403, block_page);

    let store = MemoryAuditStore::new();
    let pipeline = pipeline(MockReasoner::new(), fetcher.clone(), store.clone());

    let report = pipeline
        .audit(
            AuditInput::Url { href: href.to_string() },
            AuditOptions::new("user-3", "healthcare"),
        )
        .await
        .unwrap();

    // Strategy order: reader proxy, readability (direct fetch), metadata.
    let calls = fetcher.calls();
    assert_eq!(calls[0], "https://r.jina.ai/https://blocked.example/landing");
    assert_eq!(calls[1], href);
    assert_eq!(calls[2], href);

    // Report produced on the metadata alone.
    assert_eq!(report.model_used, "gemini-2.0-flash");
    let records = store.list("user-3", 10, 0).await.unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].extracted_text.starts_with("Title: MiracleTonic"));
}

// ---------------------------------------------------------------------------
// S4: YouTube with published captions; no audio download
// ---------------------------------------------------------------------------

#[tokio::test]
async fn s4_youtube_captions_without_audio_download() {
    let href = "https://www.youtube.com/watch?v=abc123xyz";
    let cue = "<text start=\"0\" dur=\"4\">this herbal syrup treats seasonal cough and improves immunity within days according to the narrator</text>";
    let caption_xml = format!("<transcript>{}</transcript>", cue.repeat(8));

    let fetcher = MockFetcher::new().with_response(
        "https://video.google.com/timedtext?lang=en&v=abc123xyz",
        audit::Fetched {
            bytes: caption_xml.into_bytes(),
            mime: Some("text/xml".to_string()),
            final_url: "https://video.google.com/timedtext?lang=en&v=abc123xyz".to_string(),
            status: 200,
        },
    );

    let store = MemoryAuditStore::new();
    let transcriber = MockTranscriber::new("should never be called");
    let services = Services {
        reasoner: Arc::new(MockReasoner::new()),
        transcriber: Arc::new(transcriber.clone()),
        ocr: Arc::new(MockOcr::new("")),
        rules: Arc::new(StaticRules::healthcare()),
        store: Arc::new(store.clone()),
        fetcher: Arc::new(fetcher.clone()),
    };
    let pipeline = Pipeline::new(services, PipelineConfig::default());

    pipeline
        .audit(
            AuditInput::Url { href: href.to_string() },
            AuditOptions::new("user-4", "healthcare"),
        )
        .await
        .unwrap();

    // Single caption fetch; no oEmbed, no audio download, no transcriber.
    let calls = fetcher.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].contains("timedtext"));
    assert!(transcriber.calls().is_empty());

    let records = store.list("user-4", 10, 0).await.unwrap();
    assert_eq!(records.len(), 1);
    // Spoken-word source: the transcript column is populated.
    assert!(records[0].transcript.contains("herbal syrup"));
}

// ---------------------------------------------------------------------------
// S5: PDF extraction paths
// ---------------------------------------------------------------------------

/// Build a minimal single-page PDF with embedded text, valid xref included.
fn minimal_pdf(lines: &[String]) -> Vec<u8> {
    let mut content = String::from("BT /F1 12 Tf 72 720 Td 14 TL\n");
    for line in lines {
        content.push_str(&format!("({line}) Tj T*\n"));
    }
    content.push_str("ET");

    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>".to_string(),
        format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{body}\nendobj\n", index + 1));
    }

    let xref_offset = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
    pdf.push_str("0000000000 65535 f \n");
    for offset in offsets {
        pdf.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.into_bytes()
}

#[tokio::test]
async fn s5_pdf_with_embedded_text_skips_ocr() {
    // Distinct long lines: the cleaner must not collapse them, and the
    // total stays well over the embedded-text threshold.
    let lines: Vec<String> = (0..10)
        .map(|i| {
            format!(
                "Chapter {i} of the supplement brochure claims complete relief from arthritis \
                 within ten days of starting the recommended morning dosage plan"
            )
        })
        .collect();
    let pdf = minimal_pdf(&lines);

    let ocr = MockOcr::new("ocr text");
    let store = MemoryAuditStore::new();
    let services = Services {
        reasoner: Arc::new(MockReasoner::new()),
        transcriber: Arc::new(MockTranscriber::new("")),
        ocr: Arc::new(ocr.clone()),
        rules: Arc::new(StaticRules::healthcare()),
        store: Arc::new(store.clone()),
        fetcher: Arc::new(MockFetcher::new()),
    };
    let pipeline = Pipeline::new(services, PipelineConfig::default());

    pipeline
        .audit(
            AuditInput::File {
                bytes: pdf,
                filename: "brochure.pdf".to_string(),
                mime: "application/pdf".to_string(),
            },
            AuditOptions::new("user-5", "healthcare"),
        )
        .await
        .unwrap();

    // Embedded text was over the threshold: no page OCR.
    assert!(ocr.calls().is_empty());
    let records = store.list("user-5", 10, 0).await.unwrap();
    assert!(records[0].extracted_text.contains("arthritis"));
}

#[tokio::test]
async fn s5_scanned_pdf_never_uses_the_embedded_path() {
    // A one-line PDF: far below MIN_PDF_CHARS, so the embedded-text pass
    // must not be accepted. The OCR pass needs a PDF renderer on PATH;
    // with or without one, the pipeline must not crash.
    let pdf = minimal_pdf(&["Scanned page stub".to_string()]);

    let ocr_page_text = "Recovered page text promising complete cure of diabetes within thirty \
         days, repeated across the scanned brochure with a toll free number and testimonials \
         from unnamed patients. "
        .repeat(3);
    let ocr = MockOcr::new(ocr_page_text);
    let services = Services {
        reasoner: Arc::new(MockReasoner::new()),
        transcriber: Arc::new(MockTranscriber::new("")),
        ocr: Arc::new(ocr.clone()),
        rules: Arc::new(StaticRules::healthcare()),
        store: Arc::new(MemoryAuditStore::new()),
        fetcher: Arc::new(MockFetcher::new()),
    };
    let pipeline = Pipeline::new(services, PipelineConfig::default());

    let result = pipeline
        .audit(
            AuditInput::File {
                bytes: pdf,
                filename: "scan.pdf".to_string(),
                mime: "application/pdf".to_string(),
            },
            AuditOptions::new("user-5b", "healthcare"),
        )
        .await;

    match result {
        // Renderer available: OCR ran with the configured languages.
        Ok(_) => {
            assert!(!ocr.calls().is_empty());
            assert!(ocr.calls().iter().all(|c| c.languages == "eng+hin"));
        }
        // No renderer on this machine: the plan is exhausted, not crashed.
        Err(AuditError::ExtractionExhausted { .. }) => assert!(ocr.calls().is_empty()),
        Err(other) => panic!("unexpected error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// S6: primary reasoner failure, fallback success
// ---------------------------------------------------------------------------

#[tokio::test]
async fn s6_reasoner_fallback_preserves_violations() {
    let report_json = r#"{"score": 70, "status": "Needs Review",
        "violations": [{
            "severity": "HIGH", "regulation": "ASCI Code",
            "violation_title": "Exaggerated efficacy",
            "evidence": "works instantly", "translation": "works instantly",
            "guidance": ["Tone down the claim", "Add substantiation"],
            "fix": ["Many users report benefits over time.",
                    "Results vary; consult the label for details."],
            "risk_score": 70
        }]}"#;

    let reasoner = MockReasoner::new()
        .with_error(ReasonerError::Upstream("HTTP 503 from model API".into()))
        .with_response(report_json);
    let pipeline = pipeline(reasoner, MockFetcher::new(), MemoryAuditStore::new());

    let report = pipeline
        .audit(
            AuditInput::Text {
                body: "This balm works instantly on any pain.".to_string(),
            },
            AuditOptions::new("user-6", "healthcare"),
        )
        .await
        .unwrap();

    assert!(report.used_fallback);
    assert_eq!(report.model_used, "gemini-1.5-flash");
    assert_eq!(report.violations.len(), 1);
    assert_eq!(report.violations[0].violation_title, "Exaggerated efficacy");
}

// ---------------------------------------------------------------------------
// Concurrency and cancellation properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn parallel_audits_do_not_cross_talk() {
    let store = MemoryAuditStore::new();
    let pipeline = Arc::new(pipeline(
        MockReasoner::new(),
        MockFetcher::new(),
        store.clone(),
    ));

    let mut handles = Vec::new();
    for i in 0..8 {
        let pipeline = pipeline.clone();
        handles.push(tokio::spawn(async move {
            pipeline
                .audit(
                    AuditInput::Text {
                        body: format!("Advertisement copy number {i} with no claims."),
                    },
                    AuditOptions::new(format!("user-{i}"), "healthcare"),
                )
                .await
                .unwrap()
        }));
    }

    for handle in handles {
        let report = handle.await.unwrap();
        // Default mock response is a clean report; every request gets the
        // same normalized result regardless of interleaving.
        assert_eq!(report.status, Status::Compliant);
        assert_eq!(report.score, 0);
    }
    for i in 0..8 {
        assert_eq!(store.list(&format!("user-{i}"), 10, 0).await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn cancelled_request_aborts_with_cancelled_error() {
    let pipeline = pipeline(MockReasoner::new(), MockFetcher::new(), MemoryAuditStore::new());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = pipeline
        .audit_cancellable(
            AuditInput::Url {
                href: "https://example.com/page".to_string(),
            },
            AuditOptions::new("user-7", "healthcare"),
            cancel,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::Cancelled));
}

#[tokio::test]
async fn exhausted_web_plan_reports_the_last_error() {
    // Every strategy fails: proxy 500, page 500 (readability and metadata).
    let href = "https://down.example/page";
    let fetcher = MockFetcher::new()
        .failing_with_status("https://r.jina.ai/https://down.example/page", 500)
        .failing_with_status(href, 500);

    let pipeline = pipeline(MockReasoner::new(), fetcher, MemoryAuditStore::new());
    let err = pipeline
        .audit(
            AuditInput::Url { href: href.to_string() },
            AuditOptions::new("user-8", "healthcare"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuditError::ExtractionExhausted { .. }));
}
