// ============================================================
// Layer 5 — Prediction Visualization
// ============================================================
// Runs the model over the validation partition in evaluation
// mode and hands the first `num_images` (image, predicted label)
// pairs to a render sink. The model's previous mode is put back
// afterwards, whether the routine finished, stopped early, or
// the sink failed.

use anyhow::{anyhow, Result};

use crate::domain::{
    mode::Mode,
    traits::{Model, Partition, RenderSink, RenderableBatch, RenderedPrediction, Scores},
};

/// Render up to `num_images` predictions; returns how many were rendered.
pub fn visualize_model<M, P, K>(
    model:       &mut M,
    partition:   &P,
    device:      &M::Device,
    class_names: &[String],
    num_images:  usize,
    sink:        &mut K,
) -> Result<usize>
where
    M: Model,
    M::Batch: RenderableBatch,
    P: Partition<Batch = M::Batch>,
    K: RenderSink,
{
    let previous = model.mode();
    model.set_mode(Mode::Evaluation);

    let result = render_predictions(model, partition, device, class_names, num_images, sink);

    model.set_mode(previous);
    result
}

fn render_predictions<M, P, K>(
    model:       &M,
    partition:   &P,
    device:      &M::Device,
    class_names: &[String],
    num_images:  usize,
    sink:        &mut K,
) -> Result<usize>
where
    M: Model,
    M::Batch: RenderableBatch,
    P: Partition<Batch = M::Batch>,
    K: RenderSink,
{
    let mut shown = 0;
    if num_images == 0 {
        return Ok(shown);
    }

    for batch in partition.batches() {
        let batch       = model.to_device(batch, device);
        let predictions = model.forward(&batch).predictions();

        for (index, &predicted) in predictions.iter().enumerate() {
            let label = class_names
                .get(predicted)
                .map(String::as_str)
                .ok_or_else(|| anyhow!("predicted class {predicted} has no name"))?;

            shown += 1;
            sink.render(&RenderedPrediction {
                position: shown,
                predicted,
                label,
                image: batch.render(index),
            })?;

            if shown == num_images {
                return Ok(shown);
            }
        }
    }

    tracing::debug!("Partition exhausted after {} of {} images", shown, num_images);
    Ok(shown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::traits::RenderImage;
    use crate::ml::trainer::tests::{ScriptedModel, VecBatch, VecPartition};
    use std::{cell::RefCell, rc::Rc};

    impl RenderableBatch for VecBatch {
        fn render(&self, index: usize) -> RenderImage {
            let v = self.labels[index] as u8 * 255;
            RenderImage { width: 1, height: 1, rgb: vec![v, v, v] }
        }
    }

    #[derive(Default)]
    struct CollectSink {
        items: Vec<(usize, usize, String)>,
    }

    impl RenderSink for CollectSink {
        fn render(&mut self, item: &RenderedPrediction<'_>) -> Result<()> {
            self.items.push((item.position, item.predicted, item.label.to_string()));
            Ok(())
        }
    }

    struct FailingSink;

    impl RenderSink for FailingSink {
        fn render(&mut self, _item: &RenderedPrediction<'_>) -> Result<()> {
            Err(anyhow!("display closed"))
        }
    }

    fn names() -> Vec<String> {
        vec!["ants".to_string(), "bees".to_string()]
    }

    fn model() -> ScriptedModel {
        // param 1 with val_correct[0] = 8 → every prediction is right
        let mut m = ScriptedModel::new(vec![8], Rc::new(RefCell::new(Vec::new())));
        m.param = 1;
        m
    }

    #[test]
    fn test_restores_training_mode() {
        let mut m = model();
        assert_eq!(m.mode, Mode::Training);
        let partition = VecPartition::new(vec![vec![0, 1], vec![1, 0]]);

        let mut sink = CollectSink::default();
        let shown = visualize_model(&mut m, &partition, &(), &names(), 3, &mut sink).unwrap();

        assert_eq!(shown, 3);
        assert_eq!(m.mode, Mode::Training);
        assert_eq!(
            sink.items,
            vec![
                (1, 0, "ants".to_string()),
                (2, 1, "bees".to_string()),
                (3, 1, "bees".to_string()),
            ]
        );
    }

    #[test]
    fn test_keeps_evaluation_mode() {
        let mut m = model();
        m.mode = Mode::Evaluation;
        let partition = VecPartition::new(vec![vec![0]]);
        visualize_model(&mut m, &partition, &(), &names(), 1, &mut CollectSink::default()).unwrap();
        assert_eq!(m.mode, Mode::Evaluation);
    }

    #[test]
    fn test_stops_when_partition_runs_out() {
        let mut m = model();
        let partition = VecPartition::new(vec![vec![0, 1]]);
        let mut sink = CollectSink::default();
        let shown = visualize_model(&mut m, &partition, &(), &names(), 6, &mut sink).unwrap();
        assert_eq!(shown, 2);
        assert_eq!(m.mode, Mode::Training);
    }

    #[test]
    fn test_zero_images_renders_nothing() {
        let mut m = model();
        let partition = VecPartition::new(vec![vec![0, 1]]);
        let mut sink = CollectSink::default();
        assert_eq!(visualize_model(&mut m, &partition, &(), &names(), 0, &mut sink).unwrap(), 0);
        assert!(sink.items.is_empty());
    }

    #[test]
    fn test_sink_failure_still_restores_mode() {
        let mut m = model();
        let partition = VecPartition::new(vec![vec![0, 1]]);
        let err = visualize_model(&mut m, &partition, &(), &names(), 2, &mut FailingSink);
        assert!(err.is_err());
        assert_eq!(m.mode, Mode::Training);
    }
}
