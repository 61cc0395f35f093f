use criterion::{black_box, criterion_group, criterion_main, Criterion};
use trellis_editor::model::{builders, ElementType, IdGenerator, Node};
use trellis_editor::table::VisualGrid;
use trellis_editor::{Document, EditSession};

fn messy_document(sections: usize) -> Vec<Node> {
    let mut ids = IdGenerator::from_seed("bench");
    let mut nodes = Vec::new();
    for i in 0..sections {
        nodes.push(builders::heading(&mut ids, ElementType::Heading2, &format!("Section {}", i)).into());
        nodes.push(Node::text("loose text at the root"));
        let mut table = builders::table(&mut ids, 4, 4);
        // Ragged rows for the row-length repair
        if let Some(Node::Element(row)) = table.children.get_mut(1) {
            row.children.truncate(2);
        }
        nodes.push(table.into());
        nodes.push(builders::table(&mut ids, 2, 2).into());
    }
    nodes
}

fn normalize_messy_document(c: &mut Criterion) {
    let nodes = messy_document(20);

    c.bench_function("normalize_messy_document", |b| {
        b.iter(|| {
            let mut session = EditSession::new("bench", Document::new("bench", black_box(nodes.clone())));
            session.normalize_all();
            session
        })
    });
}

fn compute_visual_grid(c: &mut Criterion) {
    let mut ids = IdGenerator::from_seed("grid");
    let mut table = builders::table(&mut ids, 30, 30);
    for row in table.children.iter_mut().step_by(3) {
        if let Some(Node::Element(cell)) = row.as_element_mut().and_then(|r| r.children.first_mut()) {
            cell.attrs.rowspan = Some(2);
        }
    }

    c.bench_function("compute_visual_grid_30x30", |b| {
        b.iter(|| VisualGrid::compute(black_box(&table)).width())
    });
}

criterion_group!(benches, normalize_messy_document, compute_visual_grid);
criterion_main!(benches);
