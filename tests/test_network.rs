//! Tests for network structure: sizing invariants, the edit/initialize
//! state machine, class and layer edits, forward pass and classification.

use glyph_trainer::error::OcrError;
use glyph_trainer::network::{Encoding, Network, NetworkKind, NetworkState, BIAS_INPUT};
use glyph_trainer::{Layer, Unit};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn rng() -> StdRng {
    StdRng::seed_from_u64(7)
}

// ============================================================================
// Dimension invariant
// ============================================================================

mod dimension_tests {
    use super::*;

    #[test]
    fn test_unit_weights_follow_previous_layer_size() {
        for (hidden, input_size) in [(vec![], 15), (vec![10], 15), (vec![8, 4], 6), (vec![3, 5, 2], 1)] {
            let mut net = Network::with_classes(Encoding::OneHot, ["a", "b", "c"]);
            for &size in &hidden {
                net.add_layer(size);
            }
            net.initialize_with(input_size, &mut rng());

            let mut expected = input_size + 1;
            for layer in net.layers() {
                for unit in layer.units() {
                    assert_eq!(unit.size(), expected);
                }
                expected = layer.size() + 1;
            }
            assert_eq!(net.output_layer().map(Layer::size), Some(3));
        }
    }

    #[test]
    fn test_forward_carries_bias_on_every_layer_input() {
        let mut net = Network::with_classes(Encoding::OneHot, ["a", "b"]);
        net.add_layer(4);
        net.initialize_with(3, &mut rng());

        let outputs = net.forward(&[0.2, 0.4, 0.6]).unwrap();
        assert_eq!(outputs.len(), 3);
        assert_eq!(outputs[0], vec![0.2, 0.4, 0.6, BIAS_INPUT]);
        assert_eq!(outputs[1].len(), 5);
        assert_eq!(outputs[1][4], BIAS_INPUT);
        assert_eq!(outputs[2].len(), 2);
        assert!(outputs[2].iter().all(|y| (0.0..=1.0).contains(y)));
    }

    #[test]
    fn test_forward_rejects_wrong_input_length() {
        let mut net = Network::with_classes(Encoding::OneHot, ["a"]);
        net.initialize_with(4, &mut rng());
        assert!(matches!(
            net.forward(&[1.0, 2.0]),
            Err(OcrError::DimensionMismatch { expected: 4, actual: 2 })
        ));
    }

    #[test]
    fn test_known_weights_give_known_output() {
        // one unit, weights [w_x, w_bias]; net = 2·1 + 1·(-1) = 1
        let layer = Layer::from_units(vec![Unit::from_weights(vec![2.0, 1.0])]);
        let net = Network::from_parts(Encoding::OneHot, vec!["a".into()], vec![layer], 1);
        assert_eq!(net.state(), NetworkState::Initialized);
        let y = net.output(&[1.0]).unwrap()[0];
        approx::assert_relative_eq!(y, 1.0 / (1.0 + (-1.0f64).exp()), epsilon = 1e-12);
    }
}

// ============================================================================
// State machine and edits
// ============================================================================

mod edit_tests {
    use super::*;

    #[test]
    fn test_new_network_is_empty() {
        let net = Network::new(Encoding::Binary);
        assert_eq!(net.state(), NetworkState::Empty);
        assert_eq!(net.layer_count(), 0);
    }

    #[test]
    fn test_every_edit_requires_initialization() {
        let mut net = Network::with_classes(Encoding::OneHot, ["a", "b"]);
        assert_eq!(net.state(), NetworkState::Edited);
        net.initialize_with(2, &mut rng());
        assert_eq!(net.state(), NetworkState::Initialized);

        net.add_class("c");
        assert!(matches!(net.forward(&[0.0, 1.0]), Err(OcrError::UninitializedNetwork)));
        net.initialize_with(2, &mut rng());

        net.add_layer(3);
        assert_eq!(net.state(), NetworkState::Edited);
        net.initialize_with(2, &mut rng());

        net.remove_layer(0).unwrap();
        assert_eq!(net.state(), NetworkState::Edited);
        net.initialize_with(2, &mut rng());

        net.set_encoding(Encoding::Binary);
        assert_eq!(net.state(), NetworkState::Edited);
    }

    #[test]
    fn test_duplicate_and_missing_classes() {
        let mut net = Network::with_classes(Encoding::OneHot, ["a"]);
        assert!(!net.add_class("a"));
        assert!(!net.remove_class("z"));
        assert!(net.remove_class("a"));
        assert!(net.classes().is_empty());
        assert!(matches!(net.target("a"), Err(OcrError::UnknownClass(_))));
    }

    #[test]
    fn test_output_layer_tracks_classes_and_encoding() {
        let mut net = Network::with_classes(Encoding::OneHot, ["a", "b", "c", "d", "e"]);
        net.add_layer(10);
        assert_eq!(net.architecture(), "10x5");
        net.use_encoding("binary").unwrap();
        assert_eq!(net.architecture(), "10x3");
        net.remove_class("e");
        assert_eq!(net.architecture(), "10x2");
    }

    #[test]
    fn test_unknown_encoding_leaves_network_untouched() {
        let mut net = Network::with_classes(Encoding::OneHot, ["a", "b"]);
        net.initialize_with(1, &mut rng());
        assert!(matches!(net.use_encoding("gray"), Err(OcrError::UnknownEncoding(_))));
        assert_eq!(net.encoding(), Encoding::OneHot);
        assert!(net.is_initialized());
    }

    #[test]
    fn test_output_layer_cannot_be_removed() {
        let mut net = Network::with_classes(Encoding::OneHot, ["a"]);
        net.add_layer(4);
        assert!(matches!(net.remove_layer(1), Err(OcrError::InvalidLayer(1))));
        assert!(matches!(net.remove_layer(7), Err(OcrError::InvalidLayer(7))));
        assert_eq!(net.remove_layer(0).unwrap().size(), 4);
        assert_eq!(net.kind(), NetworkKind::SingleLayer);
    }

    #[test]
    fn test_hidden_layers_insert_before_output() {
        let mut net = Network::with_classes(Encoding::OneHot, ["a", "b"]);
        net.add_layer(6);
        net.add_layer(4);
        assert_eq!(net.architecture(), "6x4x2");
        assert_eq!(net.hidden_layers().len(), 2);
        assert_eq!(net.kind(), NetworkKind::MultiLayer);
        assert_eq!(net.to_string(), "MultiLayerNetwork(6x4x2)");
    }

    #[test]
    fn test_from_parts_drops_repeated_classes() {
        let output = Layer::from_units(vec![
            Unit::from_weights(vec![0.1, 0.2]),
            Unit::from_weights(vec![0.3, 0.4]),
        ]);
        let classes = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let net = Network::from_parts(Encoding::OneHot, classes, vec![output], 1);
        assert_eq!(net.classes(), ["a".to_string(), "b".to_string()]);
        assert_eq!(net.state(), NetworkState::Initialized);
    }

    #[test]
    fn test_from_parts_with_mismatched_weights_needs_initialization() {
        let layer = Layer::from_units(vec![Unit::from_weights(vec![0.1, 0.2, 0.3])]);
        let net = Network::from_parts(Encoding::OneHot, vec!["a".into()], vec![layer], 5);
        assert_eq!(net.state(), NetworkState::Edited);
    }
}

// ============================================================================
// Backpropagation
// ============================================================================

mod backprop_tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 1 input -> 1 hidden unit -> 1 output unit, weights `[w, bias]`.
    fn chain() -> Network {
        let hidden = Layer::from_units(vec![Unit::from_weights(vec![0.5, 0.2])]);
        let output = Layer::from_units(vec![Unit::from_weights(vec![0.4, -0.1])]);
        Network::from_parts(Encoding::OneHot, vec!["a".into()], vec![hidden, output], 1)
    }

    #[test]
    fn test_error_terms_come_output_layer_first() {
        let net = chain();
        let outputs = net.forward(&[1.0]).unwrap();
        assert_relative_eq!(outputs[1][0], 0.574442516811659, epsilon = 1e-12);
        assert_relative_eq!(outputs[2][0], 0.5817051181538837, epsilon = 1e-12);

        let terms = net.backpropagate_errors(&outputs, &[1.0]).unwrap();
        assert_eq!(terms.size_hint(), (2, Some(2)));
        let errors: Vec<Vec<f64>> = terms.collect::<Result<_, _>>().unwrap();
        assert_eq!(errors.len(), 2);
        assert_relative_eq!(errors[0][0], 0.1017812983040222, epsilon = 1e-12);
        assert_relative_eq!(errors[1][0], 0.009952513738037377, epsilon = 1e-12);
    }

    #[test]
    fn test_train_step_returns_error_before_correction() {
        let mut net = chain();
        let error = net.train_one_example(&[1.0], &[1.0], 0.5, 0.0).unwrap();
        assert_relative_eq!(error, 0.0874853040893282, epsilon = 1e-12);

        let hidden = net.layer(0).unwrap().units()[0].weights().to_vec();
        assert_relative_eq!(hidden[0], 0.5049762568690187, epsilon = 1e-12);
        assert_relative_eq!(hidden[1], 0.1950237431309813, epsilon = 1e-12);
        let output = net.layer(1).unwrap().units()[0].weights().to_vec();
        assert_relative_eq!(output[0], 0.4292337525810604, epsilon = 1e-12);
        assert_relative_eq!(output[1], -0.1508906491520111, epsilon = 1e-12);
    }

    #[test]
    fn test_error_terms_check_target_width() {
        let net = chain();
        let outputs = net.forward(&[1.0]).unwrap();
        assert!(matches!(
            net.backpropagate_errors(&outputs, &[1.0, 0.0]),
            Err(OcrError::DimensionMismatch { expected: 1, actual: 2 })
        ));
    }
}

// ============================================================================
// Classification
// ============================================================================

mod classify_tests {
    use super::*;

    #[test]
    fn test_rank_lists_every_class_nearest_first() {
        let mut net = Network::with_classes(Encoding::OneHot, ["a", "b", "c"]);
        net.initialize_with(2, &mut rng());
        let ranking = net.rank(&[0.3, 0.7]).unwrap();
        assert_eq!(ranking.len(), 3);
        assert!(ranking.windows(2).all(|w| w[0].1 <= w[1].1));
    }

    #[test]
    fn test_classify_filters_by_distance() {
        let mut net = Network::with_classes(Encoding::OneHot, ["a", "b"]);
        net.initialize_with(2, &mut rng());
        assert!(net.classify(&[0.3, 0.7], 0.0).unwrap().is_empty());
        assert_eq!(net.classify(&[0.3, 0.7], 10.0).unwrap().len(), 2);
    }

    #[test]
    fn test_classify_requires_initialization() {
        let net = Network::with_classes(Encoding::OneHot, ["a", "b"]);
        assert!(matches!(net.classify(&[0.5], 0.5), Err(OcrError::UninitializedNetwork)));
    }
}
