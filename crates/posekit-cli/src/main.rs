//! posekit example entry point
//!
//! Builds a small beamline layout programmatically: a chicane path and a
//! dipole string instantiated from a shared template, then prints the
//! resolved primitives. An optional RON style sheet path may be given as the
//! first argument.

use glam::DVec3;

use posekit_core::{
    Angle, Assembly, Axis, Frame, Part, Path, Pose, Primitive, Style, StyleSheet,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "posekit_core=debug,posekit_cli=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Building example beamline");

    let sheet = match std::env::args().nth(1) {
        Some(path) => {
            let content = std::fs::read_to_string(&path)?;
            tracing::info!(path = %path, "loaded style sheet");
            StyleSheet::from_ron(&content)?
        }
        None => StyleSheet::default().rule(
            "~mb.*".parse()?,
            Style {
                color: Some("blue".into()),
                ..Style::default()
            },
        ),
    };

    let mut assembly = Assembly::new();

    // dipole template: a magnet body with a pipe through its center
    let mb = assembly.add_part(Part::group().with_name("mb"));
    assembly.add_child(mb, "body", Part::rectangle(1.0, 0.4).with_name("body"))?;
    assembly.add_child(mb, "pipe", Part::point().with_name("pipe"))?;

    // the beamline instantiates the template at several stations
    let line = assembly.add_part(Part::group().with_name("line"));
    for (i, station) in [3.0, 5.0, 7.0].into_iter().enumerate() {
        let name = format!("mb{}", i + 1);
        assembly.add_child_with_template(line, &name, Pose::from_xyz(station, 0.0, 0.0), mb)?;
    }

    // shift the middle dipole's pipe without touching its siblings
    let mb2 = assembly.lookup(line, "mb2")?;
    let edited = assembly.edit(mb2, "pipe")?;
    assembly.translate_part(edited, DVec3::new(0.0, 0.05, 0.0), Frame::Parent)?;

    let primitives = assembly.get_primitives(line, &sheet)?;
    tracing::info!(count = primitives.len(), "resolved primitives");
    print_primitives(&assembly, &primitives);

    // chicane: straight, two opposing bends, straight, two bends back
    let mut chicane = Path::new();
    chicane.line_by(DVec3::new(2.0, 0.0, 0.0));
    chicane.arc(Angle::Degrees(-45.0), DVec3::new(1.5, 0.0, 0.0), Axis::Z)?;
    chicane.arc(Angle::Degrees(-45.0), DVec3::new(1.5, 0.0, 0.0), Axis::Z)?;
    chicane.line_by(DVec3::new(2.0, 0.0, 0.0));
    chicane.arc(Angle::Degrees(45.0), DVec3::new(1.5, 0.0, 0.0), Axis::Z)?;
    chicane.arc(Angle::Degrees(45.0), DVec3::new(1.5, 0.0, 0.0), Axis::Z)?;

    let end = chicane.end_pose();
    tracing::info!(
        segments = chicane.segments().len(),
        x = end.x(),
        y = end.y(),
        "chicane traced"
    );

    let trace = chicane.into_part(16)?;
    let trace_id = assembly.add_child(line, "chicane", trace.with_name("chicane"))?;
    let points = assembly.world_points(trace_id)?;
    println!("chicane polyline: {} points, ends at {}", points.len(), points[points.len() - 1]);

    Ok(())
}

fn print_primitives(assembly: &Assembly, primitives: &[Primitive]) {
    for primitive in primitives {
        let part = match assembly.get(primitive.part) {
            Ok(part) => part,
            Err(e) => {
                tracing::warn!("{e}");
                continue;
            }
        };
        let name = part.name.as_deref().unwrap_or("-");
        let color = primitive.style.color.as_deref().unwrap_or("default");
        println!(
            "{:<10} {:<10} color={:<8} at {}",
            part.class_name(),
            name,
            color,
            primitive.world_pose.position()
        );
    }
}
