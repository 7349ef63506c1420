use crate::analysis::{self, Analysis};
use crate::config::{AppConfig, View};
use crate::expr::Var;
use crate::render;
use crate::surface::Section;
use eframe::egui;
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};
use log::{debug, warn};
use nalgebra::Vector2;
use std::f64::consts::{FRAC_PI_2, PI};

#[derive(PartialEq, Clone, Copy)]
enum Tab {
    Results,
    Plot,
    Sections,
}

#[derive(PartialEq, Clone)]
struct Inputs {
    func_str: String,
    x0: f64,
    y0: f64,
}

pub struct PartialDerivativesApp {
    config: AppConfig,

    // Входные данные
    func_str: String,
    x0: f64,
    y0: f64,
    view: View,
    tab: Tab,

    // Состояние
    analysis: Option<Analysis>,
    error_message: Option<String>,
    texture: Option<egui::TextureHandle>,
    last_inputs: Option<Inputs>,
    last_view: Option<View>,
}

impl PartialDerivativesApp {
    pub fn new(config: AppConfig) -> Self {
        Self {
            func_str: config.default_function.clone(),
            x0: config.default_x0,
            y0: config.default_y0,
            view: config.view,
            tab: Tab::Results,
            analysis: None,
            error_message: None,
            texture: None,
            last_inputs: None,
            last_view: None,
            config,
        }
    }

    fn inputs(&self) -> Inputs {
        Inputs {
            func_str: self.func_str.clone(),
            x0: self.x0,
            y0: self.y0,
        }
    }

    // ракурс меняет только картинку, остальное требует пересчёта
    fn refresh(&mut self, ctx: &egui::Context) {
        let inputs = self.inputs();
        if self.last_inputs.as_ref() != Some(&inputs) {
            self.last_inputs = Some(inputs);
            self.last_view = Some(self.view);
            self.recompute(ctx);
            // боковая панель уже нарисована с прежним состоянием
            ctx.request_repaint();
        } else if self.last_view != Some(self.view) {
            self.last_view = Some(self.view);
            self.redraw(ctx);
            ctx.request_repaint();
        }
    }

    fn recompute(&mut self, ctx: &egui::Context) {
        match self.run_pipeline(ctx) {
            Ok((analysis, texture)) => {
                self.analysis = Some(analysis);
                self.texture = Some(texture);
                self.error_message = None;
            }
            Err(e) => self.fail(e),
        }
    }

    fn redraw(&mut self, ctx: &egui::Context) {
        let Some(analysis) = &self.analysis else {
            return;
        };
        match self.draw(ctx, analysis) {
            Ok(texture) => self.texture = Some(texture),
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, e: anyhow::Error) {
        warn!("{:?}: {:#}", self.func_str, e);
        self.analysis = None;
        self.texture = None;
        self.error_message = Some(format!(
            "⚠ Ошибка при разборе или вычислении функции: {:#}",
            e
        ));
    }

    fn run_pipeline(&self, ctx: &egui::Context) -> anyhow::Result<(Analysis, egui::TextureHandle)> {
        let analysis = analysis::analyze(
            &self.func_str,
            Vector2::new(self.x0, self.y0),
            &self.config.grid,
        )?;
        let texture = self.draw(ctx, &analysis)?;
        Ok((analysis, texture))
    }

    fn draw(&self, ctx: &egui::Context, analysis: &Analysis) -> anyhow::Result<egui::TextureHandle> {
        let (w, h) = self.config.image_size;
        let rgb = render::render_surface(analysis, (w, h), &self.view)?;
        debug!("график {}x{} перерисован", w, h);
        let image = egui::ColorImage::from_rgb([w as usize, h as usize], &rgb);
        Ok(ctx.load_texture("surface_plot", image, egui::TextureOptions::LINEAR))
    }

    fn results_ui(ui: &mut egui::Ui, analysis: &Analysis) {
        let function = &analysis.function;
        ui.heading("Функция и частные производные");
        ui.monospace(format!("f(x, y) = {}", function.expr()));
        ui.monospace(format!("∂f/∂x = {}", function.partial(Var::X)));
        ui.monospace(format!("∂f/∂y = {}", function.partial(Var::Y)));

        egui::CollapsingHeader::new("LaTeX").show(ui, |ui| {
            for line in [
                format!("f(x, y) = {}", function.expr().to_latex()),
                format!("\\frac{{\\partial f}}{{\\partial x}} = {}", function.partial(Var::X).to_latex()),
                format!("\\frac{{\\partial f}}{{\\partial y}} = {}", function.partial(Var::Y).to_latex()),
            ] {
                ui.horizontal(|ui| {
                    ui.code(&line);
                    if ui.small_button("📋").clicked() {
                        ui.ctx().copy_text(line.clone());
                    }
                });
            }
        });

        ui.separator();
        let eval = &analysis.evaluation;
        ui.heading(format!("Значения в точке ({}, {})", eval.point.x, eval.point.y));
        ui.columns(2, |columns| {
            columns[0].label("Значение функции");
            columns[0].strong(format!("{}", eval.value));
            columns[1].label("Градиент");
            columns[1].strong(format!("({}, {})", eval.gradient.x, eval.gradient.y));
        });
    }

    fn section_plot(ui: &mut egui::Ui, id: &str, title: &str, section: &Section, point: [f64; 2]) {
        ui.label(title);
        let surface = Line::new(PlotPoints::from(section.surface.clone())).name("f");
        let tangent = Line::new(PlotPoints::from(section.tangent.clone())).name("касательная");
        let marker = Points::new(vec![point]).radius(4.0).name("(x₀, y₀)");
        Plot::new(id)
            .legend(Legend::default())
            .height((ui.available_height() / 2.0 - 20.0).max(120.0))
            .show(ui, |plot_ui| {
                plot_ui.line(surface);
                plot_ui.line(tangent);
                plot_ui.points(marker);
            });
    }
}

impl eframe::App for PartialDerivativesApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("control_panel")
            .resizable(true)
            .show(ctx, |ui| {
                ui.heading("Параметры");

                egui::CollapsingHeader::new("ℹ Как пользоваться").show(ui, |ui| {
                    ui.label("• Введите функцию двух переменных, например x**2 + y**3");
                    ui.label("• Степень: ** или ^; функции sin, cos, tan, exp, log, sqrt, ...");
                    ui.label("• Задайте точку (x₀, y₀), результаты пересчитываются сразу");
                });

                ui.horizontal(|ui| {
                    ui.label("Функция f(x, y):");
                    ui.text_edit_singleline(&mut self.func_str);
                });

                ui.horizontal(|ui| {
                    ui.label("x₀:");
                    ui.add(egui::DragValue::new(&mut self.x0).speed(0.1));
                });

                ui.horizontal(|ui| {
                    ui.label("y₀:");
                    ui.add(egui::DragValue::new(&mut self.y0).speed(0.1));
                });

                ui.separator();

                ui.label("Ракурс графика");
                ui.add(egui::Slider::new(&mut self.view.yaw, -PI..=PI).text("поворот"));
                ui.add(egui::Slider::new(&mut self.view.pitch, -FRAC_PI_2..=FRAC_PI_2).text("наклон"));
                if ui.button("Сброс ракурса").clicked() {
                    self.view = self.config.view;
                }

                if let Some(err) = &self.error_message {
                    ui.separator();
                    ui.colored_label(egui::Color32::RED, err);
                }
            });

        self.refresh(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tab, Tab::Results, "📊 Результаты");
                ui.selectable_value(&mut self.tab, Tab::Plot, "📈 Поверхность");
                ui.selectable_value(&mut self.tab, Tab::Sections, "✂ Сечения");
            });
            ui.separator();

            let Some(analysis) = &self.analysis else {
                ui.label("Исправьте функцию или точку, чтобы увидеть результаты.");
                return;
            };

            match self.tab {
                Tab::Results => Self::results_ui(ui, analysis),
                Tab::Plot => {
                    if let Some(texture) = &self.texture {
                        ui.add(egui::Image::new(texture).shrink_to_fit());
                    }
                }
                Tab::Sections => {
                    let eval = &analysis.evaluation;
                    Self::section_plot(
                        ui,
                        "section_x",
                        &format!("Сечение y = {}", eval.point.y),
                        &analysis.section_x,
                        [eval.point.x, eval.value],
                    );
                    Self::section_plot(
                        ui,
                        "section_y",
                        &format!("Сечение x = {}", eval.point.x),
                        &analysis.section_y,
                        [eval.point.y, eval.value],
                    );
                }
            }
        });
    }
}
