//! Load/save orchestration for persisted canvas data
//!
//! The editing surface hands pixel-space strokes to [`CanvasCodec::process_for_save`]
//! before they are sent to the persistence layer, and feeds whatever comes back
//! through [`CanvasCodec::process_for_load`] before rendering. Loading never
//! fails: unusable input becomes an empty drawing, reported through `tracing`
//! and any registered diagnostic listeners.

use std::sync::RwLock;

use itemize_config::{CanvasConfig, ReferenceFrame};
use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::FORMAT_VERSION;
use crate::events::{FallbackReason, LoadDiagnostic, LoadSource};
use crate::format::{CanvasInput, RejectedStroke, classify};
use crate::transform::{denormalize_strokes, normalize_strokes, rescale_strokes};
use crate::types::{CanvasDimensions, CanvasMetadata, NormalizedCanvasData, Stroke};

type DiagnosticListener = Box<dyn Fn(&LoadDiagnostic) + Send + Sync>;

/// Converts drawings between live canvas pixels and the persisted format.
///
/// The codec owns the reference frame stroke widths are anchored to. Save
/// and load must use codecs with the same frame for widths to round-trip.
pub struct CanvasCodec {
    frame: ReferenceFrame,
    listeners: RwLock<Vec<DiagnosticListener>>,
}

impl std::fmt::Debug for CanvasCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listener_count = self.listeners.read().map(|l| l.len()).unwrap_or(0);
        f.debug_struct("CanvasCodec")
            .field("frame", &self.frame)
            .field("listener_count", &listener_count)
            .finish()
    }
}

impl Default for CanvasCodec {
    fn default() -> Self {
        Self::new(ReferenceFrame::default())
    }
}

impl CanvasCodec {
    /// Create a codec anchored to the given reference frame
    pub fn new(frame: ReferenceFrame) -> Self {
        Self {
            frame,
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Create a codec from shared canvas configuration
    pub fn from_config(config: &CanvasConfig) -> Self {
        Self::new(config.reference)
    }

    /// Reference frame stroke widths are normalized against
    pub fn frame(&self) -> &ReferenceFrame {
        &self.frame
    }

    /// Register a listener for load diagnostics.
    ///
    /// Listeners run synchronously on the loading thread.
    pub fn add_diagnostic_listener<F>(&self, listener: F)
    where
        F: Fn(&LoadDiagnostic) + Send + Sync + 'static,
    {
        let mut listeners = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        listeners.push(Box::new(listener));
    }

    fn emit(&self, diagnostic: LoadDiagnostic) {
        let listeners = self.listeners.read().unwrap_or_else(|e| e.into_inner());
        for listener in listeners.iter() {
            listener(&diagnostic);
        }
    }

    /// Reconstruct pixel-space strokes for a canvas of size `canvas`.
    ///
    /// `original` is the size legacy data was captured at, when known.
    pub fn process_for_load(
        &self,
        data: &Value,
        canvas: CanvasDimensions,
        original: Option<CanvasDimensions>,
    ) -> Vec<Stroke> {
        self.process_for_load_with_source(data, canvas, original).0
    }

    /// Like [`process_for_load`](Self::process_for_load), also reporting which path was taken
    pub fn process_for_load_with_source(
        &self,
        data: &Value,
        canvas: CanvasDimensions,
        original: Option<CanvasDimensions>,
    ) -> (Vec<Stroke>, LoadSource) {
        let input = match classify(data) {
            Ok(input) => input,
            Err(err) => {
                let reason = FallbackReason::from(&err);
                warn!("Discarding canvas data ({:?}): {}", reason, err);
                self.emit(LoadDiagnostic::Discarded {
                    reason,
                    message: err.to_string(),
                });
                return (Vec::new(), LoadSource::Fallback(reason));
            }
        };

        match input {
            CanvasInput::Empty => {
                debug!("CanvasCodec::load: no stored drawing");
                (Vec::new(), LoadSource::Empty)
            }
            CanvasInput::Normalized { metadata, paths } => {
                self.check_metadata(&metadata);
                self.report_rejected(paths.rejected);
                debug!(
                    "CanvasCodec::load: denormalizing {} strokes onto {}x{}",
                    paths.strokes.len(),
                    canvas.width,
                    canvas.height
                );
                (
                    denormalize_strokes(&paths.strokes, canvas, &self.frame),
                    LoadSource::Normalized,
                )
            }
            CanvasInput::Legacy(list) => {
                self.report_rejected(list.rejected);
                let strokes = list.strokes;
                match original.filter(|o| o.is_known() && *o != canvas) {
                    Some(original) => {
                        debug!(
                            "CanvasCodec::load: rescaling {} legacy strokes from {}x{} to {}x{}",
                            strokes.len(),
                            original.width,
                            original.height,
                            canvas.width,
                            canvas.height
                        );
                        (
                            rescale_strokes(&strokes, original, canvas),
                            LoadSource::Legacy { rescaled: true },
                        )
                    }
                    None => {
                        debug!("CanvasCodec::load: {} legacy strokes used as-is", strokes.len());
                        (strokes, LoadSource::Legacy { rescaled: false })
                    }
                }
            }
        }
    }

    /// Report strokes that were left out of an otherwise usable drawing
    fn report_rejected(&self, rejected: Vec<RejectedStroke>) {
        if rejected.is_empty() {
            return;
        }
        for stroke in &rejected {
            warn!("Dropping unreadable stroke {}: {}", stroke.index, stroke.message);
        }
        self.emit(LoadDiagnostic::MalformedStrokes { rejected });
    }

    /// Warn about metadata the active codec can load but may render differently
    fn check_metadata(&self, metadata: &CanvasMetadata) {
        if metadata.version > FORMAT_VERSION {
            warn!(
                "Canvas data version {} is newer than supported version {}",
                metadata.version, FORMAT_VERSION
            );
            self.emit(LoadDiagnostic::NewerVersion {
                version: metadata.version,
            });
        }

        let stored = metadata.reference_frame();
        if stored != self.frame {
            warn!(
                "Canvas data saved against reference {}x{}, loading with {}x{}",
                stored.width, stored.height, self.frame.width, self.frame.height
            );
            self.emit(LoadDiagnostic::ReferenceMismatch {
                stored,
                active: self.frame,
            });
        }
    }

    /// Produce the persisted, dimension-independent form of a drawing.
    ///
    /// Always writes the current format version.
    pub fn process_for_save(
        &self,
        paths: &[Stroke],
        canvas: CanvasDimensions,
    ) -> NormalizedCanvasData {
        debug!(
            "CanvasCodec::save: normalizing {} strokes from {}x{}",
            paths.len(),
            canvas.width,
            canvas.height
        );
        NormalizedCanvasData {
            paths: normalize_strokes(paths, canvas, &self.frame),
            metadata: CanvasMetadata::for_frame(&self.frame),
        }
    }
}

/// Load canvas data with the default reference frame.
///
/// See [`CanvasCodec::process_for_load`].
pub fn process_canvas_data_for_load(
    data: &Value,
    canvas: CanvasDimensions,
    original: Option<CanvasDimensions>,
) -> Vec<Stroke> {
    CanvasCodec::default().process_for_load(data, canvas, original)
}

/// Save canvas data with the default reference frame.
///
/// See [`CanvasCodec::process_for_save`].
pub fn process_canvas_data_for_save(
    paths: &[Stroke],
    canvas: CanvasDimensions,
) -> NormalizedCanvasData {
    CanvasCodec::default().process_for_save(paths, canvas)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::constants::{DEFAULT_REFERENCE_HEIGHT, DEFAULT_REFERENCE_WIDTH};
    use crate::types::Point;
    use serde_json::json;

    const EPS: f64 = 1e-9;

    fn canvas(w: f64, h: f64) -> CanvasDimensions {
        CanvasDimensions::new(w, h)
    }

    fn sample_strokes() -> Vec<Stroke> {
        let mut stroke = Stroke::new(
            vec![Point::new(10.0, 20.0), Point::new(400.0, 300.0), Point::new(799.5, 0.5)],
            4.0,
            "#336699",
            true,
        );
        stroke
            .extra
            .insert("timestamp".to_string(), json!("2024-01-21T10:00:00Z"));
        vec![
            stroke,
            Stroke::new(
                vec![Point::new(50.0, 60.0)],
                20.0,
                json!({"r": 1, "g": 0, "b": 0}),
                false,
            ),
        ]
    }

    fn assert_strokes_close(a: &[Stroke], b: &[Stroke]) {
        assert_eq!(a.len(), b.len());
        for (sa, sb) in a.iter().zip(b) {
            assert_eq!(sa.paths.len(), sb.paths.len());
            for (pa, pb) in sa.paths.iter().zip(&sb.paths) {
                assert!((pa.x - pb.x).abs() < EPS);
                assert!((pa.y - pb.y).abs() < EPS);
            }
            assert!((sa.stroke_width.unwrap() - sb.stroke_width.unwrap()).abs() < EPS);
            assert_eq!(sa.stroke_color, sb.stroke_color);
            assert_eq!(sa.draw_mode, sb.draw_mode);
            assert_eq!(sa.extra, sb.extra);
        }
    }

    fn recorded(codec: &CanvasCodec) -> Arc<Mutex<Vec<LoadDiagnostic>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        codec.add_diagnostic_listener(move |d| sink.lock().unwrap().push(d.clone()));
        seen
    }

    #[test]
    fn test_save_stamps_metadata() {
        for (paths, size) in [
            (sample_strokes(), canvas(800.0, 600.0)),
            (Vec::new(), canvas(1.0, 1.0)),
            (sample_strokes(), canvas(390.0, 312.0)),
        ] {
            let saved = process_canvas_data_for_save(&paths, size);
            assert_eq!(
                saved.metadata,
                CanvasMetadata {
                    version: 1,
                    normalized: true,
                    reference_width: DEFAULT_REFERENCE_WIDTH,
                    reference_height: DEFAULT_REFERENCE_HEIGHT,
                }
            );
            assert_eq!(saved.paths.len(), paths.len());
        }
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let strokes = sample_strokes();
        let size = canvas(800.0, 600.0);
        let saved = process_canvas_data_for_save(&strokes, size);
        let value = serde_json::to_value(&saved).unwrap();
        assert!(crate::format::is_normalized_data(&value));

        let loaded = process_canvas_data_for_load(&value, size, None);
        assert_strokes_close(&loaded, &strokes);
    }

    #[test]
    fn test_load_onto_different_canvas() {
        let strokes = vec![Stroke::new(vec![Point::new(400.0, 300.0)], 7.0, "#000", true)];
        let saved = process_canvas_data_for_save(&strokes, canvas(800.0, 600.0));
        let saved = serde_json::to_value(saved).unwrap();

        let loaded = process_canvas_data_for_load(&saved, canvas(400.0, 300.0), None);
        assert!((loaded[0].paths[0].x - 200.0).abs() < EPS);
        assert!((loaded[0].paths[0].y - 150.0).abs() < EPS);
        // Half the average dimension, half the thickness
        assert!((loaded[0].stroke_width.unwrap() - 3.5).abs() < EPS);
    }

    #[test]
    fn test_load_fallbacks() {
        let size = canvas(800.0, 600.0);
        assert!(process_canvas_data_for_load(&Value::Null, size, None).is_empty());
        assert!(process_canvas_data_for_load(&json!("not json"), size, None).is_empty());
        assert!(process_canvas_data_for_load(&json!("{}"), size, None).is_empty());
        assert!(process_canvas_data_for_load(&json!(42), size, None).is_empty());
        assert!(process_canvas_data_for_load(&json!({"paths": []}), size, None).is_empty());
    }

    #[test]
    fn test_load_sources_and_diagnostics() {
        let codec = CanvasCodec::default();
        let seen = recorded(&codec);
        let size = canvas(800.0, 600.0);

        let (_, source) = codec.process_for_load_with_source(&Value::Null, size, None);
        assert_eq!(source, LoadSource::Empty);

        let (strokes, source) = codec.process_for_load_with_source(&json!("not json"), size, None);
        assert!(strokes.is_empty());
        assert_eq!(source, LoadSource::Fallback(FallbackReason::Unparseable));

        let (_, source) = codec.process_for_load_with_source(&json!("{}"), size, None);
        assert_eq!(source, LoadSource::Fallback(FallbackReason::Unrecognized));

        let bad_doc = json!({"paths": 3, "metadata": {"normalized": true}});
        let (_, source) = codec.process_for_load_with_source(&bad_doc, size, None);
        assert_eq!(source, LoadSource::Fallback(FallbackReason::MalformedDocument));

        let seen = seen.lock().unwrap();
        let reasons: Vec<_> = seen
            .iter()
            .map(|d| match d {
                LoadDiagnostic::Discarded { reason, .. } => *reason,
                other => panic!("unexpected diagnostic {other:?}"),
            })
            .collect();
        assert_eq!(
            reasons,
            vec![
                FallbackReason::Unparseable,
                FallbackReason::Unrecognized,
                FallbackReason::MalformedDocument
            ]
        );
    }

    #[test]
    fn test_legacy_rescale() {
        let data = json!([{
            "paths": [{"x": 100, "y": 100}],
            "strokeWidth": 10,
            "strokeColor": "#000",
            "drawMode": true
        }]);
        let codec = CanvasCodec::default();
        let (loaded, source) = codec.process_for_load_with_source(
            &data,
            canvas(1000.0, 500.0),
            Some(canvas(500.0, 500.0)),
        );
        assert_eq!(source, LoadSource::Legacy { rescaled: true });
        assert_eq!(loaded[0].paths, vec![Point::new(200.0, 100.0)]);
        assert_eq!(loaded[0].stroke_width, Some(15.0));
        assert_eq!(loaded[0].stroke_color, Some(json!("#000")));
        assert_eq!(loaded[0].draw_mode, Some(true));
    }

    #[test]
    fn test_legacy_identity_when_sizes_match() {
        let data = json!([{
            "paths": [{"x": 100.1, "y": 99.7}, {"x": 3, "y": 4}],
            "strokeWidth": 10,
            "strokeColor": "#000",
            "drawMode": true
        }]);
        let expected: Vec<Stroke> = serde_json::from_value(data.clone()).unwrap();
        let codec = CanvasCodec::default();

        let (loaded, source) = codec.process_for_load_with_source(
            &data,
            canvas(500.0, 500.0),
            Some(canvas(500.0, 500.0)),
        );
        assert_eq!(source, LoadSource::Legacy { rescaled: false });
        assert_eq!(loaded, expected);

        // Unknown capture size also leaves the strokes untouched
        let loaded = codec.process_for_load(&data, canvas(1000.0, 500.0), None);
        assert_eq!(loaded, expected);

        // So does a capture size that is not usable
        let unusable = Some(canvas(0.0, 500.0));
        let loaded = codec.process_for_load(&data, canvas(1000.0, 500.0), unusable);
        assert_eq!(loaded, expected);
    }

    #[test]
    fn test_legacy_identity_keeps_point_fields_and_nulls() {
        let data = json!([{
            "paths": [
                {"x": 1.0, "y": 2.0, "pressure": 0.5},
                {"x": 3.5, "y": 4.5, "pressure": 0.25, "tilt": [10, -5]}
            ],
            "strokeWidth": 3.0,
            "strokeColor": null,
            "createdAt": 1705847123456u64
        }]);
        let codec = CanvasCodec::default();

        for original in [Some(canvas(500.0, 500.0)), None] {
            let loaded = codec.process_for_load(&data, canvas(500.0, 500.0), original);
            assert_eq!(loaded[0].stroke_color, Some(Value::Null));
            assert_eq!(loaded[0].paths[1].extra["tilt"], json!([10, -5]));
            assert_eq!(serde_json::to_value(&loaded).unwrap(), data);
        }
    }

    #[test]
    fn test_point_fields_and_nulls_survive_rescale_and_save() {
        let data = json!([{
            "paths": [{"x": 100.0, "y": 100.0, "pressure": 0.5}],
            "strokeWidth": 4.0,
            "strokeColor": null
        }]);
        let size = canvas(1000.0, 1000.0);
        let loaded = process_canvas_data_for_load(&data, size, Some(canvas(500.0, 500.0)));
        assert_eq!(loaded[0].paths[0].x, 200.0);
        assert_eq!(loaded[0].paths[0].extra["pressure"], json!(0.5));
        assert_eq!(loaded[0].stroke_color, Some(Value::Null));

        let saved = serde_json::to_value(process_canvas_data_for_save(&loaded, size)).unwrap();
        assert_eq!(saved["paths"][0]["paths"][0]["pressure"], json!(0.5));
        assert_eq!(saved["paths"][0]["strokeColor"], Value::Null);
        assert!(saved["paths"][0].as_object().unwrap().contains_key("strokeColor"));

        let reloaded = process_canvas_data_for_load(&saved, size, None);
        assert_strokes_close(&reloaded, &loaded);
        assert_eq!(reloaded[0].paths[0].extra["pressure"], json!(0.5));
    }

    #[test]
    fn test_unreadable_stroke_dropped_alone() {
        let codec = CanvasCodec::default();
        let seen = recorded(&codec);
        let data = json!([
            {"paths": [{"x": 1.0, "y": 2.0}], "strokeWidth": "3"},
            {"paths": [{"x": 5.0, "y": 6.0}], "strokeWidth": 2.0}
        ]);

        let size = canvas(500.0, 500.0);
        let (loaded, source) = codec.process_for_load_with_source(&data, size, None);
        assert_eq!(source, LoadSource::Legacy { rescaled: false });
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].paths, vec![Point::new(5.0, 6.0)]);

        let seen = seen.lock().unwrap();
        match seen.as_slice() {
            [LoadDiagnostic::MalformedStrokes { rejected }] => {
                assert_eq!(rejected.len(), 1);
                assert_eq!(rejected[0].index, 0);
            }
            other => panic!("unexpected diagnostics {other:?}"),
        }
    }

    #[test]
    fn test_string_wrapped_normalized_matches_object() {
        let size = canvas(1024.0, 768.0);
        let doc = process_canvas_data_for_save(&sample_strokes(), canvas(800.0, 600.0));
        let as_value = serde_json::to_value(&doc).unwrap();
        let as_string = Value::String(serde_json::to_string(&doc).unwrap());

        let from_value = process_canvas_data_for_load(&as_value, size, None);
        let from_string = process_canvas_data_for_load(&as_string, size, None);
        assert_strokes_close(&from_string, &from_value);
    }

    #[test]
    fn test_string_wrapped_legacy_rescales() {
        let data = Value::String(
            json!([{"paths": [{"x": 50, "y": 50}], "strokeWidth": 2}]).to_string(),
        );
        let original = Some(canvas(100.0, 100.0));
        let loaded = process_canvas_data_for_load(&data, canvas(200.0, 200.0), original);
        assert_eq!(loaded[0].paths, vec![Point::new(100.0, 100.0)]);
        assert_eq!(loaded[0].stroke_width, Some(4.0));
    }

    #[test]
    fn test_unknown_fields_survive_save_and_load() {
        let size = canvas(640.0, 480.0);
        let saved = process_canvas_data_for_save(&sample_strokes(), size);
        let saved = serde_json::to_value(saved).unwrap();
        assert_eq!(saved["paths"][0]["timestamp"], json!("2024-01-21T10:00:00Z"));

        let loaded = process_canvas_data_for_load(&saved, size, None);
        assert_eq!(loaded[0].extra["timestamp"], json!("2024-01-21T10:00:00Z"));
        assert_eq!(loaded[1].stroke_color, Some(json!({"r": 1, "g": 0, "b": 0})));
        assert_eq!(loaded[1].draw_mode, Some(false));
    }

    #[test]
    fn test_custom_frame_round_trip() {
        let config = CanvasConfig {
            reference: ReferenceFrame::new(1000.0, 1000.0),
            ..Default::default()
        };
        let codec = CanvasCodec::from_config(&config);
        let strokes = sample_strokes();
        let size = canvas(500.0, 500.0);

        let saved = codec.process_for_save(&strokes, size);
        assert_eq!(saved.metadata.reference_width, 1000.0);
        assert!((saved.paths[0].stroke_width.unwrap() - 8.0).abs() < EPS);

        let loaded = codec.process_for_load(&serde_json::to_value(&saved).unwrap(), size, None);
        assert_strokes_close(&loaded, &strokes);
    }

    #[test]
    fn test_metadata_warnings() {
        let codec = CanvasCodec::default();
        let seen = recorded(&codec);
        let data = json!({
            "paths": [{"paths": [{"x": 0.5, "y": 0.5}], "strokeWidth": 3}],
            "metadata": {
                "version": 2,
                "normalized": true,
                "referenceWidth": 800,
                "referenceHeight": 600
            }
        });

        let size = canvas(800.0, 600.0);
        let (loaded, source) = codec.process_for_load_with_source(&data, size, None);
        assert_eq!(source, LoadSource::Normalized);
        assert_eq!(loaded[0].paths, vec![Point::new(400.0, 300.0)]);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                LoadDiagnostic::NewerVersion { version: 2 },
                LoadDiagnostic::ReferenceMismatch {
                    stored: ReferenceFrame::new(800.0, 600.0),
                    active: ReferenceFrame::default(),
                },
            ]
        );
    }

    #[test]
    fn test_current_documents_emit_nothing() {
        let codec = CanvasCodec::default();
        let seen = recorded(&codec);
        let size = canvas(800.0, 600.0);
        let saved = serde_json::to_value(codec.process_for_save(&sample_strokes(), size)).unwrap();
        codec.process_for_load(&saved, size, None);
        assert!(seen.lock().unwrap().is_empty());
    }
}
