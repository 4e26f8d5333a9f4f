use crate::codec::{
    Codec, Compressor, is_brotli, is_gzip, is_response_compressed, is_suspected_zopfli,
};
use crate::error::{AuditError, BoxError};
use crate::headers::{check_content_encoding, check_sdch, check_vary, disallowed_encodings};
use crate::media_type::{is_compressible, is_svg};
use crate::policy::{CompressionPolicy, FetchKind, Policies};
use crate::report::{Diagnostic, ReportSink};
use crate::resource::{FetchedResource, ProbeRequest};
use crate::size::check_size;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tower::{Service, ServiceExt};
use tracing::{debug, trace, warn};

/// One stage of the per-resource pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Skips non-200 responses and non-HTTP(S) resources.
    Filter,
    /// SVGZ is implicit gzip and ends the audit here.
    SpecialCase,
    /// Media types that should not be compressed end the audit here.
    Compressibility,
    /// Flags codings other than gzip and brotli, and SDCH.
    DisallowedEncodings,
    /// Probes with `Accept-Encoding: identity`.
    Identity,
    /// Probes with `Accept-Encoding: gzip`.
    Gzip,
    /// Probes with `Accept-Encoding: br`.
    Brotli,
}

impl Step {
    /// Steps in the order they run.
    pub const ORDER: [Step; 7] = [
        Step::Filter,
        Step::SpecialCase,
        Step::Compressibility,
        Step::DisallowedEncodings,
        Step::Identity,
        Step::Gzip,
        Step::Brotli,
    ];
}

/// Result of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Run the next step.
    Continue,
    /// No further step applies to this resource.
    Stop,
}

/// Summary of one resource audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Last step that ran.
    pub last_step: Step,
    /// Whether that step stopped the pipeline early.
    pub short_circuited: bool,
    /// Number of diagnostics reported for the resource.
    pub reported: usize,
}

/// Reports diagnostics for a single resource.
struct Reporter<'a, R> {
    sink: &'a R,
    resource: &'a FetchedResource,
    reported: usize,
}

impl<R: ReportSink> Reporter<'_, R> {
    fn report(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!(url = %self.resource.url, %message, "Compression diagnostic");

        self.sink.report(Diagnostic {
            resource_url: self.resource.url.to_string(),
            element: self.resource.element.clone(),
            message,
        });
        self.reported += 1;
    }

    fn report_all(&mut self, messages: impl IntoIterator<Item = String>) {
        for message in messages {
            self.report(message);
        }
    }
}

/// Audits fetched resources against the compression policies.
///
/// Probes are sent through `client`, any `tower::Service` that fetches a
/// [`ProbeRequest`]. Diagnostics go to `sink` as soon as they are found.
#[derive(Debug, Clone)]
pub struct CompressionAudit<S, R> {
    client: S,
    sink: R,
    policies: Policies,
}

impl<S, R> CompressionAudit<S, R> {
    /// Creates an audit with the given fetch client, sink and policies.
    pub fn new(client: S, sink: R, policies: Policies) -> Self {
        Self {
            client,
            sink,
            policies,
        }
    }

    /// Returns a reference to the fetch client.
    pub fn client(&self) -> &S {
        &self.client
    }

    /// Returns a reference to the report sink.
    pub fn sink(&self) -> &R {
        &self.sink
    }

    /// Returns the policies in effect.
    pub fn policies(&self) -> &Policies {
        &self.policies
    }

    /// Consumes the audit, returning the fetch client.
    pub fn into_inner(self) -> S {
        self.client
    }
}

impl<S, R> CompressionAudit<S, R>
where
    S: Service<ProbeRequest, Response = FetchedResource> + Clone,
    S::Error: Into<BoxError>,
    R: ReportSink,
{
    /// Audits a subresource with the `resource` policy.
    pub async fn on_fetch_end_resource(
        &self,
        resource: &FetchedResource,
    ) -> Result<Outcome, AuditError> {
        self.on_fetch_end(FetchKind::Resource, resource).await
    }

    /// Audits the web app manifest with the `resource` policy.
    pub async fn on_fetch_end_manifest(
        &self,
        resource: &FetchedResource,
    ) -> Result<Outcome, AuditError> {
        self.on_fetch_end(FetchKind::Manifest, resource).await
    }

    /// Audits the top-level document with the `target` policy.
    pub async fn on_fetch_end_target(
        &self,
        resource: &FetchedResource,
    ) -> Result<Outcome, AuditError> {
        self.on_fetch_end(FetchKind::Target, resource).await
    }

    /// Audits `resource` with the policy that governs `kind`.
    #[tracing::instrument(name = "compression_audit", skip_all, fields(url = %resource.url, ?kind))]
    pub async fn on_fetch_end(
        &self,
        kind: FetchKind,
        resource: &FetchedResource,
    ) -> Result<Outcome, AuditError> {
        let policy = *self.policies.for_kind(kind);
        self.audit(resource, &policy).await
    }

    /// Like [`on_fetch_end`](Self::on_fetch_end), but gives up as soon as
    /// `token` is cancelled.
    ///
    /// In-flight probes are dropped and nothing more is reported for the
    /// resource. Returns `Ok(None)` when cancelled.
    pub async fn audit_until_cancelled(
        &self,
        kind: FetchKind,
        resource: &FetchedResource,
        token: &CancellationToken,
    ) -> Result<Option<Outcome>, AuditError> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(url = %resource.url, "Audit cancelled");
                Ok(None)
            }
            outcome = self.on_fetch_end(kind, resource) => outcome.map(Some),
        }
    }

    /// Audits several resources, at most `concurrency` at a time.
    ///
    /// Results are returned in input order.
    pub async fn audit_all<'r, I>(
        &self,
        resources: I,
        concurrency: usize,
    ) -> Vec<Result<Outcome, AuditError>>
    where
        I: IntoIterator<Item = (FetchKind, &'r FetchedResource)>,
    {
        stream::iter(resources)
            .map(|(kind, resource)| self.on_fetch_end(kind, resource))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }

    /// Runs every step for `resource` under `policy`.
    pub async fn audit(
        &self,
        resource: &FetchedResource,
        policy: &CompressionPolicy,
    ) -> Result<Outcome, AuditError> {
        let mut reporter = Reporter {
            sink: &self.sink,
            resource,
            reported: 0,
        };

        for step in Step::ORDER {
            trace!(?step, "Running step");

            let flow = match step {
                Step::Filter => filter(resource),
                Step::SpecialCase => special_case(resource, &mut reporter),
                Step::Compressibility => compressibility(resource, &mut reporter),
                Step::DisallowedEncodings => disallowed(resource, &mut reporter),
                Step::Identity => self.identity(resource, &mut reporter).await?,
                Step::Gzip => self.gzip(resource, policy, &mut reporter).await?,
                Step::Brotli => self.brotli(resource, policy, &mut reporter).await?,
            };

            if flow == Flow::Stop {
                debug!(?step, reported = reporter.reported, "Audit stopped early");
                return Ok(Outcome {
                    last_step: step,
                    short_circuited: true,
                    reported: reporter.reported,
                });
            }
        }

        Ok(Outcome {
            last_step: Step::Brotli,
            short_circuited: false,
            reported: reporter.reported,
        })
    }

    async fn probe(&self, request: ProbeRequest) -> Result<FetchedResource, AuditError> {
        let url = request.url.to_string();
        trace!(%url, headers = ?request.headers, "Sending probe");

        self.client.clone().oneshot(request).await.map_err(|e| {
            let source: BoxError = e.into();
            warn!(%url, error = %source, "Probe failed");
            AuditError::Probe { url, source }
        })
    }

    /// A request for no encoding must get an unencoded response.
    async fn identity(
        &self,
        resource: &FetchedResource,
        reporter: &mut Reporter<'_, R>,
    ) -> Result<Flow, AuditError> {
        let response = self
            .probe(ProbeRequest::accept_encoding(resource.url.clone(), "identity"))
            .await?;
        let declared = response.content_encoding();

        if is_response_compressed(&response.body.raw_response, declared.as_deref()) {
            reporter.report(
                "Response should not be compressed for requests made with 'accept-encoding: identity'.",
            );
        }

        if declared.is_some() {
            reporter.report(
                "Response should not include 'content-encoding' header for requests made with 'accept-encoding: identity'.",
            );
        }

        Ok(Flow::Continue)
    }

    async fn gzip(
        &self,
        resource: &FetchedResource,
        policy: &CompressionPolicy,
        reporter: &mut Reporter<'_, R>,
    ) -> Result<Flow, AuditError> {
        if !policy.checks_gzip() {
            return Ok(Flow::Continue);
        }

        let request = ProbeRequest::accept_encoding(resource.url.clone(), "gzip");
        let response = self.probe(request.clone()).await?;
        let raw = &response.body.raw_response;
        let gzip = is_gzip(raw);
        let not_zopfli = is_suspected_zopfli(raw);

        if !gzip && policy.require_gzip {
            reporter.report("Response should be compressed with gzip when gzip compression is requested.");
            return Ok(Flow::Continue);
        }

        if not_zopfli && policy.require_zopfli {
            reporter.report(
                "Response should be compressed with Zopfli when gzip compression is requested.",
            );
        }

        if !gzip {
            return Ok(Flow::Continue);
        }

        let declared = response.content_encoding();
        if declared.as_deref() == Some(Codec::Gzip.content_encoding()) {
            reporter.report_all(check_size(
                Compressor::gzip_family(raw),
                raw.len(),
                response.body.raw_content.len(),
            ));
        }
        reporter.report_all(check_vary(&response.headers));
        reporter.report_all(check_content_encoding(Codec::Gzip, declared.as_deref()));

        let sniffed = self.probe(request.with_desktop_user_agent()).await?;
        let sniffed_raw = &sniffed.body.raw_response;

        if policy.require_gzip && is_gzip(sniffed_raw) != gzip {
            reporter.report(
                "Response should be compressed with gzip when gzip compression is requested, regardless of the user agent.",
            );
        } else if policy.require_zopfli && is_suspected_zopfli(sniffed_raw) != not_zopfli {
            reporter.report(
                "Response should be compressed with Zopfli when gzip compression is requested, regardless of the user agent.",
            );
        }

        Ok(Flow::Continue)
    }

    async fn brotli(
        &self,
        resource: &FetchedResource,
        policy: &CompressionPolicy,
        reporter: &mut Reporter<'_, R>,
    ) -> Result<Flow, AuditError> {
        if !policy.require_brotli {
            return Ok(Flow::Continue);
        }

        let request = ProbeRequest::accept_encoding(resource.url.clone(), "br");
        let response = self.probe(request.clone()).await?;
        let raw = &response.body.raw_response;
        let brotli = is_brotli(raw);

        // Browsers only advertise brotli over HTTPS
        if !resource.is_https() {
            if brotli {
                reporter.report("Response should not be compressed with Brotli over HTTP.");
            }
            return Ok(Flow::Continue);
        }

        if !brotli {
            reporter.report(
                "Response should be compressed with Brotli when Brotli compression is requested over HTTPS.",
            );
            return Ok(Flow::Continue);
        }

        let declared = response.content_encoding();
        if declared.as_deref() == Some(Codec::Brotli.content_encoding()) {
            reporter.report_all(check_size(
                Compressor::Brotli,
                raw.len(),
                response.body.raw_content.len(),
            ));
        }
        reporter.report_all(check_vary(&response.headers));
        reporter.report_all(check_content_encoding(Codec::Brotli, declared.as_deref()));

        let sniffed = self.probe(request.with_desktop_user_agent()).await?;
        if !is_brotli(&sniffed.body.raw_response) {
            reporter.report(
                "Response should be compressed with Brotli when Brotli compression is requested over HTTPS, regardless of the user agent.",
            );
        }

        Ok(Flow::Continue)
    }
}

fn filter(resource: &FetchedResource) -> Flow {
    if resource.status != http::StatusCode::OK || !resource.is_regular_protocol() {
        debug!(
            url = %resource.url,
            status = %resource.status,
            "Skipping resource"
        );
        return Flow::Stop;
    }

    Flow::Continue
}

/// SVGZ documents are gzip by definition and only need the right header.
fn special_case<R: ReportSink>(resource: &FetchedResource, reporter: &mut Reporter<'_, R>) -> Flow {
    let svg = is_svg(&resource.media_type) || resource.extension().as_deref() == Some("svgz");

    if !svg || !is_gzip(&resource.body.raw_response) {
        return Flow::Continue;
    }

    let declared = resource.content_encoding();
    reporter.report_all(check_content_encoding(Codec::Gzip, declared.as_deref()));

    Flow::Stop
}

/// Responses that gain nothing from compression must not be compressed.
fn compressibility<R: ReportSink>(
    resource: &FetchedResource,
    reporter: &mut Reporter<'_, R>,
) -> Flow {
    if is_compressible(&resource.media_type) {
        return Flow::Continue;
    }

    let declared = resource.content_encoding();

    if is_response_compressed(&resource.body.raw_response, declared.as_deref()) {
        reporter.report("Response should not be compressed.");
    }

    if declared.is_some() {
        reporter.report("Response should not include 'content-encoding' header.");
    }

    Flow::Stop
}

fn disallowed<R: ReportSink>(resource: &FetchedResource, reporter: &mut Reporter<'_, R>) -> Flow {
    let declared = resource.content_encoding();

    reporter.report_all(disallowed_encodings(
        declared.as_deref(),
        &resource.body.raw_response,
    ));
    reporter.report_all(check_sdch(&resource.headers));

    Flow::Continue
}
