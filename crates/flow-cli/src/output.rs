//! Terminal rendering of traces, flow graphs and explanations

use std::fmt::Write;

use colored::{ColoredString, Colorize};
use flow_graph::classify::{self, flow_status_color};
use flow_graph::{FlowLayout, FlowScene, StatusColor};
use flow_types::{
    Bottleneck, BottleneckSeverity, DependencyGraph, FlowExplanation, FlowStats, TimeRange,
    TraceSummary,
};

fn paint(text: &str, color: StatusColor) -> ColoredString {
    let c = color.color32();
    text.truecolor(c.r(), c.g(), c.b())
}

pub fn stats_line(stats: &FlowStats, range: TimeRange) -> String {
    format!(
        "{} {} flows, {} ok, {} failed, {} services",
        range.display_name().bold(),
        stats.total_flows,
        paint(&stats.successful_flows.to_string(), StatusColor::Green),
        paint(&stats.failed_flows.to_string(), StatusColor::Red),
        stats.service_count,
    )
}

pub fn trace_line(trace: &TraceSummary) -> String {
    let status = paint(trace.status.as_str(), flow_status_color(trace.status));
    let started = trace
        .start_time
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".into());
    let mut line = format!(
        "{} {} {:<16} {} {} {} nodes",
        started.dimmed(),
        trace.trace_id,
        status,
        trace.root_service,
        trace.root_endpoint.as_deref().unwrap_or(""),
        trace.node_count,
    );
    let _ = write!(line, " {}ms", trace.duration_ms);
    if trace.has_bottleneck {
        let who = trace.bottleneck_service.as_deref().unwrap_or("unknown");
        let _ = write!(line, " {} {}", "bottleneck:".yellow(), who);
    }
    line
}

/// Nodes column by column, then every edge with its label
pub fn scene_text(scene: &FlowScene) -> String {
    let view = scene.view(None, None);
    let mut out = String::new();

    if view.is_empty() {
        let _ = writeln!(out, "{}", "Empty flow graph".dimmed());
        return out;
    }
    if scene.layout().used_fallback_root() {
        let _ = writeln!(
            out,
            "{}",
            "note: no entry node found, first node used as root".dimmed()
        );
    }

    for (level, ids) in scene.layout().levels() {
        let _ = writeln!(out, "{}", format!("Level {level}").bold());
        for node in ids.iter().filter_map(|id| view.node(id)) {
            let route = match (&node.method, &node.endpoint) {
                (Some(m), Some(e)) => format!(" {m} {e}"),
                (None, Some(e)) => format!(" {e}"),
                _ => String::new(),
            };
            let _ = writeln!(
                out,
                "  {} {}{} [{}] {} {} @ ({:.0}, {:.0})",
                node.icon,
                paint(&node.label, node.health_color),
                route.dimmed(),
                node.health.as_str(),
                paint(&node.latency_label, node.latency_class.color()),
                paint(&node.error_rate_label, node.error_rate_class.color()),
                node.position.x,
                node.position.y,
            );
        }
    }

    if !view.edges.is_empty() {
        let _ = writeln!(out, "{}", "Calls".bold());
    }
    for edge in &view.edges {
        let mut label = paint(&edge.latency_label, edge.color).to_string();
        if let (Some(err), Some(color)) = (&edge.error_rate_label, edge.error_label_color) {
            let _ = write!(label, " {}", paint(err, color));
        }
        let marker = if edge.animated { "~>" } else { "->" };
        let _ = writeln!(
            out,
            "  {} {} {} {} [{}]{}",
            edge.source,
            paint(marker, edge.color),
            edge.target,
            label,
            edge.status.as_str(),
            edge.protocol
                .as_deref()
                .map(|p| format!(" {p}"))
                .unwrap_or_default(),
        );
    }
    out
}

/// Services column by column (callers left of callees), then each dependency
pub fn topology_text(graph: &DependencyGraph, layout: &FlowLayout, range: TimeRange) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} services, {} dependencies, {} traces",
        range.display_name().bold(),
        layout.len(),
        graph.dependencies.len(),
        graph.total_traces,
    );
    if layout.is_empty() {
        let _ = writeln!(out, "{}", "No service dependencies recorded".dimmed());
        return out;
    }

    for (level, services) in layout.levels() {
        let _ = writeln!(out, "{}", format!("Level {level}").bold());
        for service in services {
            let _ = writeln!(
                out,
                "  {} {}",
                service,
                format!(
                    "(in {}, out {})",
                    graph.fan_in(service),
                    graph.fan_out(service)
                )
                .dimmed(),
            );
        }
    }

    if !graph.dependencies.is_empty() {
        let _ = writeln!(out, "{}", "Dependencies".bold());
    }
    for dep in &graph.dependencies {
        let latency = classify::format_latency(dep.avg_latency_ms);
        let errors = classify::format_error_rate(dep.error_rate);
        let _ = writeln!(
            out,
            "  {} -> {} {} {} p95 {} {} req{}",
            dep.source_service,
            dep.target_service,
            paint(&latency, classify::latency_class(dep.avg_latency_ms).color()),
            paint(&errors, classify::error_rate_class(dep.error_rate).color()),
            classify::format_latency(dep.p95_latency_ms),
            dep.request_count,
            dep.protocol
                .as_deref()
                .map(|p| format!(" {p}"))
                .unwrap_or_default(),
        );
    }
    out
}

pub fn explanation_text(explanation: &FlowExplanation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "Summary".bold());
    let _ = writeln!(out, "  {}", explanation.summary);
    if let Some(service) = &explanation.bottleneck_service {
        let _ = writeln!(out, "{} {}", "Bottleneck:".bold(), paint(service, StatusColor::Amber));
    }
    if let Some(cause) = &explanation.root_cause {
        let _ = writeln!(out, "{} {}", "Root cause:".bold(), cause);
    }
    if !explanation.recommendations.is_empty() {
        let _ = writeln!(out, "{}", "Recommendations".bold());
        for rec in &explanation.recommendations {
            let _ = writeln!(out, "  - {rec}");
        }
    }
    if let Some(impact) = &explanation.estimated_impact {
        let _ = writeln!(out, "{} {}", "Estimated impact:".bold(), impact);
    }
    out
}

pub fn bottleneck_line(b: &Bottleneck) -> String {
    let color = match b.severity {
        BottleneckSeverity::Critical => StatusColor::DarkRed,
        BottleneckSeverity::High => StatusColor::Red,
        BottleneckSeverity::Medium => StatusColor::Amber,
        BottleneckSeverity::Low => StatusColor::Green,
    };
    format!(
        "  {} {} {:?} {}",
        paint(&format!("{:?}", b.severity).to_uppercase(), color),
        b.service_name.as_deref().unwrap_or(&b.element_id),
        b.bottleneck_type,
        b.description,
    )
}
