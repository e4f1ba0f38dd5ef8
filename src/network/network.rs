use std::fmt;

use rand::Rng;

use crate::error::{OcrError, Result};
use crate::layers::dense::Layer;
use crate::loss::mse::SquaredErrorLoss;
use crate::network::backprop::ErrorTerms;
use crate::network::encoding::Encoding;
use crate::optim::sgd::MomentumSgd;

/// Bias input appended to every layer's input vector.
pub const BIAS_INPUT: f64 = -1.0;

/// Structural validity of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    /// No layers at all.
    Empty,
    /// Classes, layers or encoding changed since the last `initialize`.
    Edited,
    /// Weights are sized consistently; training and inference are allowed.
    Initialized,
}

/// Single-layer or multi-layer network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkKind {
    SingleLayer,
    MultiLayer,
}

/// A multi-layer perceptron whose output layer is sized by its class list
/// and output encoding.
///
/// The last layer is always the output layer; hidden layers are inserted
/// before it. Any structural edit moves the network back to
/// [`NetworkState::Edited`] and `initialize` must run before the next
/// forward pass.
#[derive(Debug, Clone, Default)]
pub struct Network {
    layers: Vec<Layer>,
    classes: Vec<String>,
    encoding: Encoding,
    /// Set by `initialize`; `None` while an edit is pending.
    input_size: Option<usize>,
}

impl Network {
    pub fn new(encoding: Encoding) -> Network {
        Network { encoding, ..Network::default() }
    }

    /// A network with `classes` already added, in order.
    pub fn with_classes<I, S>(encoding: Encoding, classes: I) -> Network
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut network = Network::new(encoding);
        for class in classes {
            network.add_class(class);
        }
        network
    }

    /// Rebuilds a network from stored parts.
    ///
    /// The stored weights are kept and the network is `Initialized` when
    /// they satisfy the size invariants for `input_size`; otherwise the
    /// layers are kept as an edited structure awaiting `initialize`.
    /// Repeated class labels keep their first occurrence.
    pub fn from_parts(
        encoding: Encoding,
        classes: Vec<String>,
        layers: Vec<Layer>,
        input_size: usize,
    ) -> Network {
        let mut unique: Vec<String> = Vec::with_capacity(classes.len());
        for class in classes {
            if unique.contains(&class) {
                log::warn!("dropping repeated class {class:?}");
            } else {
                unique.push(class);
            }
        }
        let mut network = Network { layers, classes: unique, encoding, input_size: None };
        let width = network.encoding.width(network.classes.len());
        if network.layers.last().map(Layer::size) != Some(width) {
            log::warn!(
                "stored output layer does not match {} classes under {} encoding, rebuilding it",
                network.classes.len(),
                network.encoding
            );
            network.rebuild_output_layer();
        } else if network.is_consistent_with(input_size) {
            network.input_size = Some(input_size);
        } else {
            log::warn!("stored weights do not fit input size {input_size}, network needs initialization");
        }
        network
    }

    fn is_consistent_with(&self, input_size: usize) -> bool {
        let mut expected = input_size + 1;
        for layer in &self.layers {
            if !layer.accepts(expected) {
                return false;
            }
            expected = layer.size() + 1;
        }
        true
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn state(&self) -> NetworkState {
        if self.input_size.is_some() {
            NetworkState::Initialized
        } else if self.layers.is_empty() {
            NetworkState::Empty
        } else {
            NetworkState::Edited
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.input_size.is_some()
    }

    pub fn input_size(&self) -> Option<usize> {
        self.input_size
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn layers(&self) -> impl ExactSizeIterator<Item = &Layer> {
        self.layers.iter()
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn output_layer(&self) -> Option<&Layer> {
        self.layers.last()
    }

    pub fn hidden_layers(&self) -> &[Layer] {
        match self.layers.split_last() {
            Some((_, hidden)) => hidden,
            None => &[],
        }
    }

    /// Layer sizes joined by `x`, e.g. `"10x5"` for one hidden layer of 10
    /// units and an output layer of 5.
    pub fn architecture(&self) -> String {
        self.layers.iter()
            .map(|layer| layer.size().to_string())
            .collect::<Vec<_>>()
            .join("x")
    }

    pub fn kind(&self) -> NetworkKind {
        if self.layers.len() > 1 {
            NetworkKind::MultiLayer
        } else {
            NetworkKind::SingleLayer
        }
    }

    pub fn class_index(&self, class: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == class)
    }

    // ---------------------------------------------------------------------
    // Encoding
    // ---------------------------------------------------------------------

    pub fn target_for_index(&self, index: usize) -> Vec<f64> {
        self.encoding.encode(index, self.classes.len())
    }

    /// Encoded target vector of a class label.
    pub fn target(&self, class: &str) -> Result<Vec<f64>> {
        self.class_index(class)
            .map(|index| self.target_for_index(index))
            .ok_or_else(|| OcrError::UnknownClass(class.to_owned()))
    }

    /// Switches encoding by name; an unknown name leaves the network untouched.
    pub fn use_encoding(&mut self, name: &str) -> Result<()> {
        let encoding = name.parse::<Encoding>()?;
        self.set_encoding(encoding);
        Ok(())
    }

    pub fn set_encoding(&mut self, encoding: Encoding) {
        if encoding != self.encoding {
            self.encoding = encoding;
            self.rebuild_output_layer();
        }
    }

    // ---------------------------------------------------------------------
    // Structural edits
    // ---------------------------------------------------------------------

    /// Adds a class; returns false if it was already present.
    pub fn add_class(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.classes.contains(&name) {
            return false;
        }
        log::debug!("adding class {name:?}");
        self.classes.push(name);
        self.rebuild_output_layer();
        true
    }

    /// Removes a class; returns false if it was not present.
    pub fn remove_class(&mut self, name: &str) -> bool {
        let Some(index) = self.class_index(name) else {
            return false;
        };
        log::debug!("removing class {name:?}");
        self.classes.remove(index);
        self.rebuild_output_layer();
        true
    }

    /// Replaces the output layer with fresh units sized for the current
    /// classes and encoding.
    fn rebuild_output_layer(&mut self) {
        let output = Layer::new(self.encoding.width(self.classes.len()));
        match self.layers.last_mut() {
            Some(last) => *last = output,
            None => self.layers.push(output),
        }
        self.input_size = None;
    }

    /// Inserts a hidden layer of `size` units just before the output layer.
    pub fn add_layer(&mut self, size: usize) {
        if self.layers.is_empty() {
            self.rebuild_output_layer();
        }
        let at = self.layers.len() - 1;
        self.layers.insert(at, Layer::new(size));
        self.input_size = None;
        log::debug!("inserted hidden layer of {size} units, architecture is now {}", self.architecture());
    }

    /// Removes hidden layer `index`; the output layer cannot be removed.
    pub fn remove_layer(&mut self, index: usize) -> Result<Layer> {
        if index + 1 >= self.layers.len() {
            return Err(OcrError::InvalidLayer(index));
        }
        let layer = self.layers.remove(index);
        self.input_size = None;
        Ok(layer)
    }

    /// Sizes and randomizes every unit for inputs of length `input_size`.
    pub fn initialize(&mut self, input_size: usize) {
        self.initialize_with(input_size, &mut rand::thread_rng());
    }

    pub fn initialize_with<R: Rng + ?Sized>(&mut self, input_size: usize, rng: &mut R) {
        if self.layers.is_empty() {
            self.rebuild_output_layer();
        }
        let mut size = input_size + 1;
        for layer in &mut self.layers {
            layer.initialize_with(size, rng);
            size = layer.size() + 1;
        }
        self.input_size = Some(input_size);
        log::debug!("initialized {} network for {input_size} inputs", self.architecture());
    }

    // ---------------------------------------------------------------------
    // Inference
    // ---------------------------------------------------------------------

    fn check_input(&self, input: &[f64]) -> Result<()> {
        let expected = self.input_size.ok_or(OcrError::UninitializedNetwork)?;
        if input.len() != expected {
            return Err(OcrError::DimensionMismatch { expected, actual: input.len() });
        }
        Ok(())
    }

    /// Output of every layer, starting with the input itself.
    ///
    /// Every entry but the last carries the trailing bias input, so entry
    /// `k` is exactly what layer `k` consumes.
    pub fn forward(&self, input: &[f64]) -> Result<Vec<Vec<f64>>> {
        self.check_input(input)?;
        let mut first = input.to_vec();
        first.push(BIAS_INPUT);
        let mut outputs = vec![first];
        let last = self.layers.len().saturating_sub(1);
        for (i, layer) in self.layers.iter().enumerate() {
            let mut output = layer.feed_from(&outputs[i])?;
            if i < last {
                output.push(BIAS_INPUT);
            }
            outputs.push(output);
        }
        Ok(outputs)
    }

    /// Output layer activations only.
    pub fn output(&self, input: &[f64]) -> Result<Vec<f64>> {
        let mut outputs = self.forward(input)?;
        Ok(outputs.pop().unwrap_or_default())
    }

    /// Error terms of every unit, output layer first, computed lazily.
    pub fn backpropagate_errors<'a>(
        &'a self,
        outputs: &'a [Vec<f64>],
        target: &'a [f64],
    ) -> Result<ErrorTerms<'a>> {
        if !self.is_initialized() {
            return Err(OcrError::UninitializedNetwork);
        }
        ErrorTerms::new(&self.layers, outputs, target)
    }

    /// One online backprop step; returns the error before correction.
    pub fn train_one_example(
        &mut self,
        input: &[f64],
        target: &[f64],
        learning_rate: f64,
        momentum: f64,
    ) -> Result<f64> {
        let outputs = self.forward(input)?;
        let errors = self.backpropagate_errors(&outputs, target)?
            .collect::<Result<Vec<_>>>()?;
        let error = SquaredErrorLoss::loss(outputs.last().map_or(&[][..], Vec::as_slice), target);

        let optimizer = MomentumSgd::new(learning_rate, momentum);
        for (layer, (layer_errors, layer_input)) in self.layers.iter_mut().rev()
            .zip(errors.into_iter().zip(outputs.iter().rev().skip(1)))
        {
            for (unit, e) in layer.units_mut().iter_mut().zip(layer_errors) {
                let delta = layer_input.iter().map(|x| e * x).collect();
                optimizer.step(unit, delta)?;
            }
        }
        Ok(error)
    }

    /// Every class with its distance `½·‖target - output‖`, nearest first.
    /// Equal distances keep class insertion order.
    pub fn rank(&self, features: &[f64]) -> Result<Vec<(String, f64)>> {
        let output = self.output(features)?;
        let mut ranking: Vec<(String, f64)> = self.classes.iter().enumerate()
            .map(|(index, class)| {
                let target = self.target_for_index(index);
                let norm = target.iter().zip(&output)
                    .map(|(t, y)| (t - y).powi(2))
                    .sum::<f64>()
                    .sqrt();
                (class.clone(), 0.5 * norm)
            })
            .collect();
        ranking.sort_by(|a, b| a.1.total_cmp(&b.1));
        Ok(ranking)
    }

    /// Classes closer than `max_distance`, most probable first.
    pub fn classify(&self, features: &[f64], max_distance: f64) -> Result<Vec<String>> {
        Ok(self.rank(features)?
            .into_iter()
            .filter(|(_, distance)| *distance < max_distance)
            .map(|(class, _)| class)
            .collect())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind() {
            NetworkKind::SingleLayer => "SingleLayer",
            NetworkKind::MultiLayer => "MultiLayer",
        };
        write!(f, "{kind}Network({})", self.architecture())
    }
}
